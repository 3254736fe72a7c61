//! Light data derivation.
//!
//! The culling layer hands the renderer a list of visible lights each
//! frame. This module selects the main light and derives the per-frame
//! light and shadow data the scheduler and passes consume. It never touches
//! light transforms or GPU buffers; those belong to the excluded lighting
//! passes.

use glam::{Vec2, Vec3, Vec4};

use crate::settings::{LightRenderingMode, PipelineSettings};

/// Upper bound on additional lights visible in one frame.
pub const MAX_VISIBLE_ADDITIONAL_LIGHTS: usize = 256;

/// Upper bound on additional lights shaded per object.
pub const MAX_PER_OBJECT_LIGHTS: usize = 8;

/// Handle to a scene light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(pub u64);

/// Kind of a visible light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// One entry of the culled visible-light list.
///
/// `id` is `None` for particle-system lights. The culling layer sorts those
/// last, so a `None` entry means every remaining entry is a particle light;
/// scans over the list stop there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleLight {
    pub id: Option<LightId>,
    pub kind: LightKind,
    pub intensity: f32,
    pub cast_shadows: bool,
    /// Per-light depth/normal shadow bias override. `None` uses the
    /// pipeline settings.
    pub shadow_bias: Option<Vec2>,
    /// Per-light shadow map resolution override.
    pub shadow_resolution: Option<u32>,
}

impl VisibleLight {
    /// A directional scene light.
    pub fn directional(id: u64, intensity: f32) -> Self {
        Self {
            id: Some(LightId(id)),
            kind: LightKind::Directional,
            intensity,
            cast_shadows: false,
            shadow_bias: None,
            shadow_resolution: None,
        }
    }

    /// A point scene light.
    pub fn point(id: u64, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point,
            ..Self::directional(id, intensity)
        }
    }

    /// A spot scene light.
    pub fn spot(id: u64, intensity: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            ..Self::directional(id, intensity)
        }
    }

    /// A particle-system light. These have no scene light and sort last.
    pub fn particle(kind: LightKind, intensity: f32) -> Self {
        Self {
            id: None,
            kind,
            intensity,
            cast_shadows: false,
            shadow_bias: None,
            shadow_resolution: None,
        }
    }

    pub fn with_shadows(mut self) -> Self {
        self.cast_shadows = true;
        self
    }
}

/// Per-frame light counts and main-light selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightData {
    /// Index of the main light in the visible-light list, if any.
    pub main_light_index: Option<usize>,
    /// Number of additional lights shaded this frame.
    pub additional_lights_count: usize,
    /// Cap on additional lights shaded per object.
    pub max_per_object_additional_lights: usize,
    /// True when additional lights are shaded per vertex.
    pub shade_additional_lights_per_vertex: bool,
}

/// Per-frame shadow configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowData {
    pub main_light_shadows_enabled: bool,
    pub main_shadowmap_width: u32,
    pub main_shadowmap_height: u32,
    pub cascade_count: u32,
    /// Normalized cascade split distances. Unused components are zero.
    pub cascade_splits: Vec3,
    pub additional_light_shadows_enabled: bool,
    pub additional_shadowmap_resolution: u32,
    pub soft_shadows_enabled: bool,
    pub shadowmap_depth_bits: u32,
    /// Per visible light: (depth bias, normal bias, 0, 0).
    pub bias: Vec<Vec4>,
    /// Per visible light: shadow map resolution.
    pub resolutions: Vec<u32>,
}

/// Select the main light. The main light is always a directional light.
///
/// The scene's designated sun wins when visible; otherwise the brightest
/// visible directional light. Scanning stops at the first particle light
/// since the list sorts those last.
pub fn main_light_index(
    settings: &PipelineSettings,
    visible_lights: &[VisibleLight],
    sun: Option<LightId>,
) -> Option<usize> {
    if visible_lights.is_empty() || settings.main_light_mode != LightRenderingMode::PerPixel {
        return None;
    }

    let mut brightest_index = None;
    let mut brightest_intensity = 0.0f32;

    for (i, light) in visible_lights.iter().enumerate() {
        let Some(id) = light.id else {
            // All remaining entries are particle lights; either there is no
            // main light or we already found it.
            break;
        };

        if light.kind == LightKind::Directional {
            if sun == Some(id) {
                return Some(i);
            }

            if light.intensity > brightest_intensity {
                brightest_intensity = light.intensity;
                brightest_index = Some(i);
            }
        }
    }

    brightest_index
}

/// Derive per-frame light counts from the visible-light list.
pub fn initialize_light_data(
    settings: &PipelineSettings,
    visible_lights: &[VisibleLight],
    main_light: Option<usize>,
) -> LightData {
    let (additional_lights_count, max_per_object_additional_lights) =
        if settings.additional_lights_mode != LightRenderingMode::Disabled {
            let candidates = visible_lights.len() - usize::from(main_light.is_some());
            (
                candidates.min(MAX_VISIBLE_ADDITIONAL_LIGHTS),
                settings.max_additional_lights.min(MAX_PER_OBJECT_LIGHTS),
            )
        } else {
            (0, 0)
        };

    LightData {
        main_light_index: main_light,
        additional_lights_count,
        max_per_object_additional_lights,
        shade_additional_lights_per_vertex: settings.additional_lights_mode
            == LightRenderingMode::PerVertex,
    }
}

/// Derive per-frame shadow configuration.
pub fn initialize_shadow_data(
    settings: &PipelineSettings,
    visible_lights: &[VisibleLight],
    main_light_casts_shadows: bool,
    additional_lights_cast_shadows: bool,
) -> ShadowData {
    let mut bias = Vec::with_capacity(visible_lights.len());
    let mut resolutions = Vec::with_capacity(visible_lights.len());

    for light in visible_lights {
        match light.shadow_bias {
            Some(b) => bias.push(Vec4::new(b.x, b.y, 0.0, 0.0)),
            None => bias.push(Vec4::new(
                settings.shadow_depth_bias,
                settings.shadow_normal_bias,
                0.0,
                0.0,
            )),
        }
        resolutions.push(
            light
                .shadow_resolution
                .unwrap_or(settings.additional_lights_shadowmap_resolution),
        );
    }

    let main_light_shadows_enabled =
        settings.supports_main_light_shadows && main_light_casts_shadows;
    let additional_light_shadows_enabled =
        settings.supports_additional_light_shadows && additional_lights_cast_shadows;

    let cascade_splits = match settings.cascade_count {
        1 => Vec3::new(1.0, 0.0, 0.0),
        2 => Vec3::new(settings.cascade_2_split, 1.0, 0.0),
        3 => Vec3::new(settings.cascade_3_split.x, settings.cascade_3_split.y, 0.0),
        _ => settings.cascade_4_split,
    };

    ShadowData {
        main_light_shadows_enabled,
        main_shadowmap_width: settings.main_light_shadowmap_resolution,
        main_shadowmap_height: settings.main_light_shadowmap_resolution,
        cascade_count: settings.cascade_count,
        cascade_splits,
        additional_light_shadows_enabled,
        additional_shadowmap_resolution: settings.additional_lights_shadowmap_resolution,
        soft_shadows_enabled: settings.supports_soft_shadows
            && (main_light_shadows_enabled || additional_light_shadows_enabled),
        shadowmap_depth_bits: 16,
        bias,
        resolutions,
    }
}
