//! Camera model.
//!
//! [`CameraDescriptor`] is the user-authored, persistent description of a
//! camera: where it renders, how it clears, and which overlays stack on top
//! of it. [`CameraData`] is the immutable per-frame snapshot derived from a
//! descriptor (and, for overlays, from its base camera) that the renderer
//! consumes.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::types::{ClearFlags, Color, Rect, RenderTargetDescriptor, TextureFormat, TextureId};

/// Render scale variations smaller than this are discarded.
const RENDER_SCALE_THRESHOLD: f32 = 0.05;

/// How a camera participates in a frame.
///
/// Base cameras render a full image and may resolve to the final output.
/// Overlay cameras composite on top of a previously rendered target and
/// never clear color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraRenderType {
    #[default]
    Base,
    Overlay,
}

/// What the camera shows behind rendered geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundMode {
    /// Draw the scene skybox. Falls back to a color clear when the scene
    /// has no skybox.
    Skybox,
    /// Clear to the camera's background color.
    #[default]
    SolidColor,
    /// Keep whatever is already in the target; only depth is cleared.
    Nothing,
}

/// Post-processing anti-aliasing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AntialiasingMode {
    #[default]
    None,
    FastApproximate,
    SubpixelMorphological,
}

/// Anti-aliasing quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AntialiasingQuality {
    Low,
    Medium,
    #[default]
    High,
}

/// Per-camera override of a pipeline-level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraOverride {
    Off,
    On,
    #[default]
    UsePipelineSettings,
}

impl CameraOverride {
    /// Resolve against the pipeline-level value.
    pub fn resolve(self, pipeline_setting: bool) -> bool {
        match self {
            Self::Off => false,
            Self::On => true,
            Self::UsePipelineSettings => pipeline_setting,
        }
    }
}

/// Camera projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            fov_y: std::f32::consts::FRAC_PI_4,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Projection::Perspective {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Projection::Orthographic {
            left: -half_w,
            right: half_w,
            bottom: -half_h,
            top: half_h,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        match self {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(*fov_y, *aspect, *near, *far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(*left, *right, *bottom, *top, *near, *far),
        }
    }

    pub fn near(&self) -> f32 {
        match self {
            Projection::Perspective { near, .. } => *near,
            Projection::Orthographic { near, .. } => *near,
        }
    }

    pub fn far(&self) -> f32 {
        match self {
            Projection::Perspective { far, .. } => *far,
            Projection::Orthographic { far, .. } => *far,
        }
    }

    #[inline]
    pub fn is_perspective(&self) -> bool {
        matches!(self, Projection::Perspective { .. })
    }
}

/// A texture a camera renders into instead of the final output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetTexture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub samples: u32,
}

impl TargetTexture {
    /// True for offscreen depth capture targets.
    #[inline]
    pub fn is_depth_only(&self) -> bool {
        self.format.is_depth()
    }
}

/// User-authored camera description. Persists across frames.
#[derive(Debug, Clone)]
pub struct CameraDescriptor {
    pub name: String,
    pub render_type: CameraRenderType,
    /// Frame ordering. Cameras render in ascending priority; ties keep
    /// their input order.
    pub priority: i32,
    /// Viewport in pixels.
    pub pixel_rect: Rect,
    pub view_matrix: Mat4,
    pub projection: Projection,
    pub background: BackgroundMode,
    pub background_color: Color,
    /// Whether an overlay camera clears depth before rendering. Base
    /// cameras always clear depth as part of their first-use clear.
    pub clear_depth: bool,
    /// Render into this texture instead of the final output.
    pub target_texture: Option<TargetTexture>,
    pub allow_msaa: bool,
    pub allow_hdr: bool,
    pub render_post_processing: bool,
    pub antialiasing: AntialiasingMode,
    pub antialiasing_quality: AntialiasingQuality,
    pub render_shadows: bool,
    pub requires_depth_texture: CameraOverride,
    pub requires_opaque_texture: CameraOverride,
    /// Index into the pipeline's renderer list. `None` selects the default
    /// renderer.
    pub renderer_index: Option<usize>,
    /// Ordered overlay camera indices. Only meaningful on base cameras.
    pub stack: Vec<usize>,
}

impl Default for CameraDescriptor {
    fn default() -> Self {
        Self {
            name: "Camera".to_string(),
            render_type: CameraRenderType::Base,
            priority: 0,
            pixel_rect: Rect::from_size(1280.0, 720.0),
            view_matrix: Mat4::IDENTITY,
            projection: Projection::default(),
            background: BackgroundMode::SolidColor,
            background_color: Color::BLACK,
            clear_depth: true,
            target_texture: None,
            allow_msaa: true,
            allow_hdr: true,
            render_post_processing: false,
            antialiasing: AntialiasingMode::None,
            antialiasing_quality: AntialiasingQuality::High,
            render_shadows: true,
            requires_depth_texture: CameraOverride::UsePipelineSettings,
            requires_opaque_texture: CameraOverride::UsePipelineSettings,
            renderer_index: None,
            stack: Vec::new(),
        }
    }
}

impl CameraDescriptor {
    /// The camera stack. Only base cameras have one; asking an overlay
    /// camera logs a warning and yields nothing.
    pub fn camera_stack(&self) -> Option<&[usize]> {
        if self.render_type != CameraRenderType::Base {
            log::warn!(
                "{}: only base cameras can have a camera stack",
                self.name
            );
            return None;
        }
        Some(&self.stack)
    }
}

/// Immutable per-frame camera snapshot.
///
/// Built once per camera per frame; overlay cameras inherit target and
/// output settings from their base camera.
#[derive(Debug, Clone)]
pub struct CameraData {
    pub name: String,
    pub render_type: CameraRenderType,
    pub view_matrix: Mat4,
    /// Projection with the overlay aspect-ratio correction already applied.
    pub projection_matrix: Mat4,
    pub near: f32,
    pub far: f32,
    /// Viewport of the stack (the base camera's viewport).
    pub pixel_rect: Rect,
    pub aspect_ratio: f32,
    pub render_scale: f32,
    pub hdr: bool,
    /// Target the whole stack renders into, if not the final output.
    pub target_texture: Option<TargetTexture>,
    pub target_descriptor: RenderTargetDescriptor,
    /// How the camera target must be cleared the first time it is bound
    /// this camera.
    pub camera_clear_flags: ClearFlags,
    pub background_color: Color,
    /// Whether a skybox pass should draw this camera's background.
    pub draw_skybox: bool,
    pub clear_depth: bool,
    /// Shadow rendering distance; zero disables shadows for this camera.
    pub max_shadow_distance: f32,
    pub post_process_enabled: bool,
    pub antialiasing: AntialiasingMode,
    pub antialiasing_quality: AntialiasingQuality,
    pub requires_depth_texture: bool,
    pub requires_opaque_texture: bool,
    pub renderer_index: Option<usize>,
    /// True only on the last camera executed in a stack; that camera
    /// resolves to the final output and releases per-stack state.
    pub resolve_final_target: bool,
}

impl CameraData {
    /// Build the GPU-facing uniform block for this camera.
    pub fn uniform_data(&self) -> CameraUniformData {
        let view = self.view_matrix;
        let proj = self.projection_matrix;
        let inv_view = view.inverse();

        CameraUniformData {
            view,
            proj,
            view_proj: proj * view,
            inv_view,
            inv_proj: proj.inverse(),
            position: inv_view.w_axis,
            near_far: Vec4::new(self.near, self.far, 0.0, 0.0),
        }
    }
}

/// Per-camera uniform data uploaded at the camera setup point.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniformData {
    pub view: Mat4,
    pub proj: Mat4,
    pub view_proj: Mat4,
    pub inv_view: Mat4,
    pub inv_proj: Mat4,
    pub position: Vec4,
    pub near_far: Vec4,
}

/// Derive the clear flags used for the camera target's first bind.
///
/// Overlay cameras composite on top of previous output and never clear
/// color; they clear depth only when configured to. A skybox background
/// with a skybox present clears depth only, since the skybox overwrites
/// color anyway; without one it degrades to a full clear. A "nothing"
/// background keeps color and clears depth.
pub fn camera_clear_flags(
    render_type: CameraRenderType,
    clear_depth: bool,
    background: BackgroundMode,
    scene_has_skybox: bool,
) -> ClearFlags {
    if render_type == CameraRenderType::Overlay {
        return if clear_depth {
            ClearFlags::DEPTH
        } else {
            ClearFlags::empty()
        };
    }

    if (background == BackgroundMode::Skybox && scene_has_skybox)
        || background == BackgroundMode::Nothing
    {
        return ClearFlags::DEPTH;
    }

    ClearFlags::ALL
}

/// Derive the camera target descriptor for a stack.
///
/// Without an explicit target texture the descriptor tracks the scaled
/// viewport and picks an HDR format when enabled; with one, the texture's
/// own size, format and sample count win.
pub fn create_target_descriptor(
    camera: &CameraDescriptor,
    render_scale: f32,
    hdr: bool,
    msaa_samples: u32,
) -> RenderTargetDescriptor {
    match &camera.target_texture {
        None => RenderTargetDescriptor {
            width: (camera.pixel_rect.width * render_scale) as u32,
            height: (camera.pixel_rect.height * render_scale) as u32,
            format: if hdr {
                TextureFormat::Rgba16Float
            } else {
                TextureFormat::Rgba8Unorm
            },
            samples: msaa_samples,
            depth_bits: 32,
        },
        Some(texture) => RenderTargetDescriptor {
            width: texture.width,
            height: texture.height,
            format: texture.format,
            samples: texture.samples,
            depth_bits: 32,
        },
    }
}

/// Discard render scale variations below the threshold.
pub(crate) fn resolve_render_scale(render_scale: f32) -> f32 {
    if (1.0 - render_scale).abs() < RENDER_SCALE_THRESHOLD {
        1.0
    } else {
        render_scale
    }
}
