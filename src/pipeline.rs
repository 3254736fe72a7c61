//! Frame orchestration.
//!
//! [`FramePipeline`] drives one frame: it stable-sorts cameras by priority,
//! derives per-camera [`CameraData`] (overlays inherit stack-wide settings
//! from their base camera), and runs each camera stack through its
//! renderer. Per-camera failures are caught here, logged, and degrade to
//! skipping that camera; nothing propagates out of a frame.
//!
//! All of this is strictly sequential on the rendering thread. The
//! renderer's queue and bound-attachment state are borrowed mutably for
//! the duration of a camera, so a second frame can't observe them
//! mid-flight.

use crate::backend::RenderBackend;
use crate::camera::{
    camera_clear_flags, create_target_descriptor, resolve_render_scale, AntialiasingMode,
    BackgroundMode, CameraData, CameraDescriptor, CameraRenderType,
};
use crate::error::{RendererError, RendererResult};
use crate::lights::{
    initialize_light_data, initialize_shadow_data, main_light_index, LightData, LightId,
    LightKind, ShadowData, VisibleLight,
};
use crate::profiling::ProfilingScope;
use crate::renderer::Renderer;
use crate::settings::{ColorGradingMode, LightRenderingMode, PipelineSettings};

/// Everything the pipeline needs for one frame, already extracted by the
/// scene/culling layer.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// All cameras participating in the frame. Overlay cameras are
    /// referenced by index from their base camera's stack.
    pub cameras: &'a [CameraDescriptor],
    /// Visible lights, particle-system lights sorted last.
    pub visible_lights: &'a [VisibleLight],
    /// The scene's designated sun, if any. Must be a directional light.
    pub sun: Option<LightId>,
    /// Whether the scene has a skybox to draw.
    pub has_skybox: bool,
}

impl<'a> FrameInput<'a> {
    pub fn new(cameras: &'a [CameraDescriptor]) -> Self {
        Self {
            cameras,
            visible_lights: &[],
            sun: None,
            has_skybox: false,
        }
    }

    pub fn with_lights(mut self, lights: &'a [VisibleLight], sun: Option<LightId>) -> Self {
        self.visible_lights = lights;
        self.sun = sun;
        self
    }

    pub fn with_skybox(mut self) -> Self {
        self.has_skybox = true;
        self
    }
}

/// Post-processing configuration for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcessingData {
    pub grading_mode: ColorGradingMode,
    pub lut_size: u32,
    pub use_fast_srgb_linear_conversion: bool,
}

/// Read-only bundle handed to every pass execution.
#[derive(Debug, Clone)]
pub struct RenderingData {
    pub camera: CameraData,
    pub lights: LightData,
    pub shadows: ShadowData,
    pub post_processing: PostProcessingData,
    /// True when any camera in the current stack has post-processing
    /// enabled.
    pub post_processing_enabled: bool,
}

/// The frame orchestrator.
pub struct FramePipeline {
    settings: PipelineSettings,
    renderers: Vec<Renderer>,
    /// Scratch for the per-frame camera ordering; reused across frames.
    camera_order: Vec<usize>,
    /// Scratch for validated overlay indices of the current stack.
    stack_scratch: Vec<usize>,
    frame_count: u64,
}

impl FramePipeline {
    /// Create a pipeline with a single default forward renderer.
    pub fn new(settings: PipelineSettings) -> Self {
        Self::with_renderers(settings, vec![Renderer::new("forward")])
    }

    /// Create a pipeline with an explicit renderer list. The renderer at
    /// index 0 is the default.
    pub fn with_renderers(settings: PipelineSettings, renderers: Vec<Renderer>) -> Self {
        Self {
            settings,
            renderers,
            camera_order: Vec::new(),
            stack_scratch: Vec::new(),
            frame_count: 0,
        }
    }

    #[inline]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Register another renderer; returns its index for camera assignment.
    pub fn add_renderer(&mut self, renderer: Renderer) -> usize {
        self.renderers.push(renderer);
        self.renderers.len() - 1
    }

    pub fn renderer_mut(&mut self, index: usize) -> Option<&mut Renderer> {
        self.renderers.get_mut(index)
    }

    /// Number of frames rendered so far.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Render one frame.
    ///
    /// Cameras render in ascending priority; ties keep their input order.
    /// Overlay cameras are skipped here and render as part of their base
    /// camera's stack. A camera that fails is logged and dropped for this
    /// frame; the rest of the frame proceeds.
    pub fn render_frame(&mut self, backend: &mut dyn RenderBackend, frame: &FrameInput<'_>) {
        let _scope = ProfilingScope::new("render_frame");

        let mut order = std::mem::take(&mut self.camera_order);
        order.clear();
        order.extend(0..frame.cameras.len());
        order.sort_by_key(|&index| frame.cameras[index].priority);

        for &index in &order {
            let camera = &frame.cameras[index];
            if camera.render_type == CameraRenderType::Overlay {
                continue;
            }

            if let Err(error) = self.render_camera_stack(backend, frame, index) {
                log::warn!("camera '{}' will be skipped: {error}", camera.name);
            }
        }

        self.camera_order = order;
        self.frame_count = self.frame_count.wrapping_add(1);
    }

    /// Render one base camera and its overlay stack.
    ///
    /// The base renders first, then the overlays in list order; only the
    /// last camera of the stack resolves to the final target. Invalid
    /// stack entries are logged and skipped. Usable standalone for
    /// procedural cameras; only base cameras may start a stack.
    pub fn render_camera_stack(
        &mut self,
        backend: &mut dyn RenderBackend,
        frame: &FrameInput<'_>,
        base_index: usize,
    ) -> RendererResult<()> {
        let base = frame
            .cameras
            .get(base_index)
            .ok_or_else(|| RendererError::Internal(format!("camera index {base_index} out of range")))?;
        if base.render_type != CameraRenderType::Base {
            return Err(RendererError::NotABaseCamera(base.name.clone()));
        }

        let _scope = ProfilingScope::new("render_camera_stack");

        let mut stack = std::mem::take(&mut self.stack_scratch);
        stack.clear();
        for &overlay_index in base.camera_stack().unwrap_or(&[]) {
            match frame.cameras.get(overlay_index) {
                Some(overlay) if overlay.render_type == CameraRenderType::Overlay => {
                    stack.push(overlay_index);
                }
                Some(overlay) => {
                    log::warn!(
                        "{}: stacked camera '{}' is not an overlay camera and was skipped",
                        base.name,
                        overlay.name
                    );
                }
                None => {
                    log::warn!(
                        "{}: stack entry {overlay_index} does not exist and was skipped",
                        base.name
                    );
                }
            }
        }

        let any_post_processing = base.render_post_processing
            || stack
                .iter()
                .any(|&index| frame.cameras[index].render_post_processing);

        let base_data = initialize_camera_data(
            &self.settings,
            base,
            base,
            stack.is_empty(),
            any_post_processing,
            frame.has_skybox,
        );
        let result = self.render_single_camera(backend, frame, base_data, any_post_processing);

        if result.is_ok() {
            let last_position = stack.len().saturating_sub(1);
            for (position, &overlay_index) in stack.iter().enumerate() {
                let overlay = &frame.cameras[overlay_index];
                let overlay_data = initialize_camera_data(
                    &self.settings,
                    base,
                    overlay,
                    position == last_position,
                    any_post_processing,
                    frame.has_skybox,
                );
                if let Err(error) =
                    self.render_single_camera(backend, frame, overlay_data, any_post_processing)
                {
                    log::warn!("overlay camera '{}' will be skipped: {error}", overlay.name);
                }
            }
        }

        self.stack_scratch = stack;
        result
    }

    fn render_single_camera(
        &mut self,
        backend: &mut dyn RenderBackend,
        frame: &FrameInput<'_>,
        camera: CameraData,
        any_post_processing: bool,
    ) -> RendererResult<()> {
        if self.renderers.is_empty() {
            return Err(RendererError::MissingRenderer(camera.name.clone()));
        }

        let renderer_index = match camera.renderer_index {
            None => 0,
            Some(index) if index < self.renderers.len() => index,
            Some(index) => {
                log::warn!(
                    "camera '{}': renderer index {index} is out of range, falling back to '{}'",
                    camera.name,
                    self.renderers[0].name()
                );
                0
            }
        };

        let data = initialize_rendering_data(&self.settings, frame, camera, any_post_processing);

        let renderer = &mut self.renderers[renderer_index];
        renderer.begin_camera(&data.camera);
        renderer.execute(backend, &data);
        Ok(())
    }
}

/// Build the per-frame camera snapshot.
///
/// Stack-wide output settings (viewport, target, HDR, MSAA, render scale,
/// anti-aliasing) come from the base camera; per-camera settings (clearing,
/// shadows, post-processing, matrices) from the camera itself. For base
/// cameras both are the same descriptor.
pub(crate) fn initialize_camera_data(
    settings: &PipelineSettings,
    base: &CameraDescriptor,
    camera: &CameraDescriptor,
    resolve_final_target: bool,
    any_post_processing: bool,
    has_skybox: bool,
) -> CameraData {
    let is_overlay = camera.render_type == CameraRenderType::Overlay;

    // Settings shared by the whole stack.
    let pixel_rect = base.pixel_rect;
    let aspect_ratio = pixel_rect.aspect_ratio();
    let render_scale = if base.target_texture.is_some() {
        1.0
    } else {
        resolve_render_scale(settings.render_scale)
    };
    let hdr = base.allow_hdr && settings.hdr;
    let msaa_samples = if base.allow_msaa && settings.msaa_samples > 1 {
        base.target_texture
            .map(|t| t.samples)
            .unwrap_or(settings.msaa_samples)
    } else {
        1
    };
    let target_descriptor = create_target_descriptor(base, render_scale, hdr, msaa_samples);
    let antialiasing = base.antialiasing;
    let antialiasing_quality = base.antialiasing_quality;

    // Settings that differ per camera in the stack.
    let clear_depth = if is_overlay { camera.clear_depth } else { true };

    let mut max_shadow_distance = settings.shadow_distance.min(camera.projection.far());
    let shadows_in_range =
        settings.any_shadows_enabled() && max_shadow_distance >= camera.projection.near();
    if !shadows_in_range || !camera.render_shadows {
        max_shadow_distance = 0.0;
    }

    let post_process_enabled = camera.render_post_processing && any_post_processing;

    let mut requires_depth_texture = camera
        .requires_depth_texture
        .resolve(settings.supports_camera_depth_texture);
    if post_process_enabled && antialiasing == AntialiasingMode::SubpixelMorphological {
        requires_depth_texture = true;
    }
    let mut requires_opaque_texture = camera
        .requires_opaque_texture
        .resolve(settings.supports_camera_opaque_texture);
    if is_overlay {
        // Depth and opaque copies would break pass execution implicitly
        // when stacking; overlays never get them.
        requires_depth_texture = false;
        requires_opaque_texture = false;
    }

    // Overlay cameras render into the base camera's viewport. When the
    // aspect ratios differ, rescale the projection's horizontal scale term
    // to the base aspect so overlay geometry doesn't stretch.
    let mut projection_matrix = camera.projection.matrix();
    if is_overlay && camera.projection.is_perspective() && camera.pixel_rect != base.pixel_rect {
        let overlay_aspect = camera.pixel_rect.aspect_ratio();
        let cotangent = projection_matrix.x_axis.x * overlay_aspect;
        projection_matrix.x_axis.x = cotangent / aspect_ratio;
    }

    let clear_flags = camera_clear_flags(
        camera.render_type,
        clear_depth,
        camera.background,
        has_skybox,
    );
    let draw_skybox = camera.background == BackgroundMode::Skybox && has_skybox && !is_overlay;

    CameraData {
        name: camera.name.clone(),
        render_type: camera.render_type,
        view_matrix: camera.view_matrix,
        projection_matrix,
        near: camera.projection.near(),
        far: camera.projection.far(),
        pixel_rect,
        aspect_ratio,
        render_scale,
        hdr,
        target_texture: base.target_texture,
        target_descriptor,
        camera_clear_flags: clear_flags,
        background_color: camera.background_color,
        draw_skybox,
        clear_depth,
        max_shadow_distance,
        post_process_enabled,
        antialiasing,
        antialiasing_quality,
        requires_depth_texture,
        requires_opaque_texture,
        renderer_index: camera.renderer_index,
        resolve_final_target,
    }
}

/// Build the read-only per-frame bundle for one camera.
pub fn initialize_rendering_data(
    settings: &PipelineSettings,
    frame: &FrameInput<'_>,
    camera: CameraData,
    any_post_processing: bool,
) -> RenderingData {
    let main_light = main_light_index(settings, frame.visible_lights, frame.sun);

    let mut main_light_casts_shadows = false;
    let mut additional_lights_cast_shadows = false;

    if camera.max_shadow_distance > 0.0 {
        main_light_casts_shadows = main_light
            .map(|index| {
                let light = &frame.visible_lights[index];
                light.id.is_some() && light.cast_shadows
            })
            .unwrap_or(false);

        // Per-vertex additional lights cannot cast shadows, and additional
        // directional lights are not shadowed.
        if settings.additional_lights_mode == LightRenderingMode::PerPixel {
            for (index, light) in frame.visible_lights.iter().enumerate() {
                if Some(index) == main_light {
                    continue;
                }
                if matches!(light.kind, LightKind::Spot | LightKind::Point)
                    && light.id.is_some()
                    && light.cast_shadows
                {
                    additional_lights_cast_shadows = true;
                    break;
                }
            }
        }
    }

    let lights = initialize_light_data(settings, frame.visible_lights, main_light);
    let shadows = initialize_shadow_data(
        settings,
        frame.visible_lights,
        main_light_casts_shadows,
        additional_lights_cast_shadows && !lights.shade_additional_lights_per_vertex,
    );

    RenderingData {
        camera,
        lights,
        shadows,
        post_processing: initialize_post_processing_data(settings),
        post_processing_enabled: any_post_processing,
    }
}

/// Derive the frame's post-processing configuration.
pub fn initialize_post_processing_data(settings: &PipelineSettings) -> PostProcessingData {
    PostProcessingData {
        grading_mode: if settings.hdr {
            settings.color_grading_mode
        } else {
            ColorGradingMode::LowDynamicRange
        },
        lut_size: settings.color_grading_lut_size,
        use_fast_srgb_linear_conversion: settings.use_fast_srgb_linear_conversion,
    }
}
