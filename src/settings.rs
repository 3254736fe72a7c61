//! Pipeline-wide settings.
//!
//! These come from the excluded asset/configuration layer; camera data
//! derivation consumes them read-only each frame.

use glam::{Vec2, Vec3};

/// How a class of lights is shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightRenderingMode {
    Disabled,
    PerVertex,
    #[default]
    PerPixel,
}

/// Color grading precision for post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorGradingMode {
    #[default]
    LowDynamicRange,
    HighDynamicRange,
}

/// Configuration for the frame pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Maximum distance at which shadows render.
    pub shadow_distance: f32,
    /// Number of main-light shadow cascades (1..=4).
    pub cascade_count: u32,
    pub cascade_2_split: f32,
    pub cascade_3_split: Vec2,
    pub cascade_4_split: Vec3,
    pub main_light_shadowmap_resolution: u32,
    pub additional_lights_shadowmap_resolution: u32,
    pub supports_main_light_shadows: bool,
    pub supports_additional_light_shadows: bool,
    pub supports_soft_shadows: bool,
    pub shadow_depth_bias: f32,
    pub shadow_normal_bias: f32,
    pub main_light_mode: LightRenderingMode,
    pub additional_lights_mode: LightRenderingMode,
    /// Cap on additional lights shaded per object, before the hard limit.
    pub max_additional_lights: usize,
    /// MSAA sample count for camera targets (1 = off).
    pub msaa_samples: u32,
    /// Resolution scale applied to camera targets.
    pub render_scale: f32,
    pub hdr: bool,
    /// Whether cameras get a readable depth texture by default.
    pub supports_camera_depth_texture: bool,
    /// Whether cameras get a readable opaque color texture by default.
    pub supports_camera_opaque_texture: bool,
    pub color_grading_mode: ColorGradingMode,
    pub color_grading_lut_size: u32,
    pub use_fast_srgb_linear_conversion: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            shadow_distance: 50.0,
            cascade_count: 4,
            cascade_2_split: 0.25,
            cascade_3_split: Vec2::new(0.1, 0.3),
            cascade_4_split: Vec3::new(0.067, 0.2, 0.467),
            main_light_shadowmap_resolution: 2048,
            additional_lights_shadowmap_resolution: 512,
            supports_main_light_shadows: true,
            supports_additional_light_shadows: true,
            supports_soft_shadows: false,
            shadow_depth_bias: 1.0,
            shadow_normal_bias: 1.0,
            main_light_mode: LightRenderingMode::PerPixel,
            additional_lights_mode: LightRenderingMode::PerPixel,
            max_additional_lights: 4,
            msaa_samples: 1,
            render_scale: 1.0,
            hdr: false,
            supports_camera_depth_texture: false,
            supports_camera_opaque_texture: false,
            color_grading_mode: ColorGradingMode::LowDynamicRange,
            color_grading_lut_size: 32,
            use_fast_srgb_linear_conversion: false,
        }
    }
}

impl PipelineSettings {
    /// True when any shadow rendering is enabled at the pipeline level.
    #[inline]
    pub fn any_shadows_enabled(&self) -> bool {
        self.supports_main_light_shadows || self.supports_additional_light_shadows
    }
}
