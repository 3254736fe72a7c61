//! The forward renderer.
//!
//! A [`Renderer`] owns the mutable per-frame state of one rendering
//! strategy: the active pass queue, the camera target assignment, and the
//! attachment binder. The orchestrator drives it once per camera:
//!
//! ```ignore
//! renderer.begin_camera(&rendering_data.camera); // collect passes
//! renderer.execute(&mut backend, &rendering_data); // schedule + bind + run
//! ```
//!
//! Execution partitions the sorted queue into blocks and establishes camera
//! state between the before-rendering block and the main blocks. The queue
//! drains after every camera; the camera target assignment persists across
//! a stack so overlay cameras composite onto the previously rendered
//! target, and is released when the stack resolves.

mod binder;
mod feature;

pub use binder::AttachmentBinder;
pub use feature::{PassQueue, RendererFeature};

use crate::backend::RenderBackend;
use crate::camera::{CameraData, CameraRenderType};
use crate::pass::draw::{DrawObjectsPass, DrawSkyboxPass, FinalBlitPass};
use crate::pass::RenderPass;
use crate::pipeline::RenderingData;
use crate::profiling::ProfilingScope;
use crate::scheduler::{sort_stable, RenderBlock, RenderBlocks};
use crate::types::{RenderTargetHandle, TextureId};

/// Shared intermediate color attachment used when a camera stack cannot
/// render straight to the final output. Allocated by the resource layer
/// under this well-known handle.
pub const CAMERA_COLOR_TEXTURE: RenderTargetHandle =
    RenderTargetHandle::Texture(TextureId(u64::MAX - 1));

/// Shared intermediate depth attachment paired with
/// [`CAMERA_COLOR_TEXTURE`]. Unlike the final output's depth surface it can
/// be cleared independently, which is what lets overlay cameras clear depth
/// without touching the color they composite onto.
pub const CAMERA_DEPTH_TEXTURE: RenderTargetHandle =
    RenderTargetHandle::Texture(TextureId(u64::MAX - 2));

/// A rendering strategy with its per-frame mutable state.
///
/// Multiple renderers can coexist in one pipeline (cameras select one by
/// index); each owns its state exclusively, so nothing here is shared
/// between concurrently prepared frames.
pub struct Renderer {
    name: String,
    features: Vec<Box<dyn RendererFeature>>,
    queue: Vec<Box<dyn RenderPass>>,
    binder: AttachmentBinder,
    /// Camera target assignment for the current stack. Set by base
    /// cameras, inherited by their overlays.
    active_camera_color: RenderTargetHandle,
    active_camera_depth: RenderTargetHandle,
}

impl Renderer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
            queue: Vec::with_capacity(32),
            binder: AttachmentBinder::new(),
            active_camera_color: RenderTargetHandle::FinalOutput,
            active_camera_depth: RenderTargetHandle::FinalOutput,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a feature. Features contribute passes every camera, in
    /// registration order.
    pub fn add_feature(&mut self, feature: Box<dyn RendererFeature>) {
        self.features.push(feature);
    }

    /// Enqueue a pass for the current camera.
    pub fn enqueue_pass(&mut self, pass: Box<dyn RenderPass>) {
        self.queue.push(pass);
    }

    /// Number of passes queued for the current camera.
    pub fn queued_pass_count(&self) -> usize {
        self.queue.len()
    }

    /// Redirect the camera target assignment for the current stack.
    pub fn configure_camera_target(
        &mut self,
        color: RenderTargetHandle,
        depth: RenderTargetHandle,
    ) {
        self.active_camera_color = color;
        self.active_camera_depth = depth;
        self.binder.configure_camera_target(color, depth);
    }

    /// Start a camera: reset bound state, assign camera targets, and
    /// collect this camera's passes.
    pub fn begin_camera(&mut self, camera: &CameraData) {
        self.binder.reset(camera.render_type);

        // Base cameras restart the stack's target assignment. A base that
        // resolves directly (no overlays) renders straight to the final
        // output; a stacked base renders into the shared intermediate
        // attachments, which its overlays inherit and composite onto. The
        // intermediate depth attachment is what makes overlay depth clears
        // possible at all.
        if camera.render_type == CameraRenderType::Base {
            if camera.resolve_final_target {
                self.active_camera_color = RenderTargetHandle::FinalOutput;
                self.active_camera_depth = RenderTargetHandle::FinalOutput;
            } else {
                self.active_camera_color = CAMERA_COLOR_TEXTURE;
                self.active_camera_depth = CAMERA_DEPTH_TEXTURE;
            }
        }
        self.binder
            .configure_camera_target(self.active_camera_color, self.active_camera_depth);

        // Feature-contributed passes, in registration order.
        {
            let mut queue = PassQueue::new(&mut self.queue);
            for feature in &mut self.features {
                if !feature.is_active() {
                    continue;
                }
                feature.add_render_passes(&mut queue, camera);
            }
        }

        // Built-in forward passes. Offscreen depth capture cameras write
        // depth through the full draw sequence; everything else gets a
        // skybox pass only when the camera actually shows one.
        let offscreen_depth = camera
            .target_texture
            .map(|t| t.is_depth_only())
            .unwrap_or(false);

        self.queue.push(Box::new(DrawObjectsPass::opaque()));
        if offscreen_depth || camera.draw_skybox {
            self.queue.push(Box::new(DrawSkyboxPass::new()));
        }
        self.queue.push(Box::new(DrawObjectsPass::transparent()));

        // A stack rendered through the intermediate attachments reaches the
        // final output on its resolving camera.
        if camera.resolve_final_target
            && self.active_camera_color != RenderTargetHandle::FinalOutput
        {
            self.queue.push(Box::new(FinalBlitPass::new()));
        }
    }

    /// Schedule and run the collected passes.
    ///
    /// Execution order is exactly block, then event, then enqueue order.
    /// Empty blocks are skipped outright: no binder call, no profiling
    /// scope.
    pub fn execute(&mut self, backend: &mut dyn RenderBackend, data: &RenderingData) {
        let _scope = ProfilingScope::new("renderer_execute");

        {
            let _scope = ProfilingScope::new("sort_render_passes");
            sort_stable(&mut self.queue);
        }
        let blocks = RenderBlocks::new(&self.queue);

        // Inputs that don't depend on camera state, e.g. shadow maps.
        self.execute_block(RenderBlock::BeforeRendering, &blocks, backend, data);

        {
            // Fixed synchronization point: camera state must be established
            // before the main blocks run.
            let _scope = ProfilingScope::new("setup_camera");
            backend.set_camera_uniforms(&data.camera.uniform_data());
        }

        self.execute_block(RenderBlock::MainOpaque, &blocks, backend, data);
        self.execute_block(RenderBlock::MainTransparent, &blocks, backend, data);
        self.execute_block(RenderBlock::AfterRendering, &blocks, backend, data);

        self.finish_camera(data.camera.resolve_final_target);
    }

    fn execute_block(
        &mut self,
        block: RenderBlock,
        blocks: &RenderBlocks,
        backend: &mut dyn RenderBackend,
        data: &RenderingData,
    ) {
        if blocks.is_empty(block) {
            return;
        }

        let _scope = ProfilingScope::new(block.name());

        let queue = &mut self.queue;
        let binder = &mut self.binder;
        for index in blocks.range(block) {
            let pass = &mut queue[index];
            pass.configure(&data.camera.target_descriptor);
            binder.bind_pass_attachments(backend, pass.attachments(), pass.event(), &data.camera);
            pass.execute(backend, data);
        }
    }

    fn finish_camera(&mut self, resolve_final_target: bool) {
        // Every camera drains the queue it collected; pass instances do not
        // survive into the next camera.
        self.queue.clear();

        if resolve_final_target {
            // The stack is complete; release its target assignment.
            self.active_camera_color = RenderTargetHandle::FinalOutput;
            self.active_camera_depth = RenderTargetHandle::FinalOutput;
            log::trace!("{}: camera stack resolved", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOp, DummyBackend};
    use crate::camera::{AntialiasingMode, AntialiasingQuality, TargetTexture};
    use crate::lights;
    use crate::pass::{PassAttachments, RenderPassEvent};
    use crate::pipeline::{initialize_post_processing_data, RenderingData};
    use crate::settings::PipelineSettings;
    use crate::types::{
        ClearFlags, Color, Rect, RenderTargetDescriptor, TextureFormat, TextureId,
    };
    use glam::Mat4;

    fn test_camera_data(render_type: CameraRenderType) -> CameraData {
        CameraData {
            name: "test".to_string(),
            render_type,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            near: 0.1,
            far: 100.0,
            pixel_rect: Rect::from_size(640.0, 480.0),
            aspect_ratio: 640.0 / 480.0,
            render_scale: 1.0,
            hdr: false,
            target_texture: None,
            target_descriptor: RenderTargetDescriptor::default(),
            camera_clear_flags: ClearFlags::ALL,
            background_color: Color::BLACK,
            draw_skybox: false,
            clear_depth: true,
            max_shadow_distance: 0.0,
            post_process_enabled: false,
            antialiasing: AntialiasingMode::None,
            antialiasing_quality: AntialiasingQuality::High,
            requires_depth_texture: false,
            requires_opaque_texture: false,
            renderer_index: None,
            resolve_final_target: true,
        }
    }

    fn test_rendering_data(camera: CameraData) -> RenderingData {
        let settings = PipelineSettings::default();
        RenderingData {
            camera,
            lights: lights::initialize_light_data(&settings, &[], None),
            shadows: lights::initialize_shadow_data(&settings, &[], false, false),
            post_processing: initialize_post_processing_data(&settings),
            post_processing_enabled: false,
        }
    }

    struct TaggedPass {
        label: &'static str,
        event: RenderPassEvent,
        attachments: PassAttachments,
    }

    impl TaggedPass {
        fn boxed(label: &'static str, event: RenderPassEvent) -> Box<dyn RenderPass> {
            Box::new(Self {
                label,
                event,
                attachments: PassAttachments::default(),
            })
        }
    }

    impl RenderPass for TaggedPass {
        fn name(&self) -> &str {
            self.label
        }

        fn event(&self) -> RenderPassEvent {
            self.event
        }

        fn attachments(&self) -> &PassAttachments {
            &self.attachments
        }

        fn execute(&self, backend: &mut dyn RenderBackend, _data: &RenderingData) {
            backend.draw(self.label);
        }
    }

    struct TaggedFeature {
        label: &'static str,
        event: RenderPassEvent,
        active: bool,
    }

    impl RendererFeature for TaggedFeature {
        fn name(&self) -> &str {
            self.label
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn add_render_passes(&mut self, queue: &mut PassQueue<'_>, _camera: &CameraData) {
            queue.enqueue(TaggedPass::boxed(self.label, self.event));
        }
    }

    #[test]
    fn forward_setup_enqueues_builtin_passes() {
        let mut renderer = Renderer::new("forward");

        let camera = CameraData {
            draw_skybox: true,
            ..test_camera_data(CameraRenderType::Base)
        };
        renderer.begin_camera(&camera);
        assert_eq!(renderer.queued_pass_count(), 3);

        renderer.queue.clear();
        let camera = test_camera_data(CameraRenderType::Base);
        renderer.begin_camera(&camera);
        assert_eq!(renderer.queued_pass_count(), 2);
    }

    #[test]
    fn offscreen_depth_camera_keeps_full_draw_sequence() {
        let mut renderer = Renderer::new("forward");
        let camera = CameraData {
            target_texture: Some(TargetTexture {
                id: TextureId(1),
                width: 512,
                height: 512,
                format: TextureFormat::Depth32Float,
                samples: 1,
            }),
            ..test_camera_data(CameraRenderType::Base)
        };

        renderer.begin_camera(&camera);
        assert_eq!(renderer.queued_pass_count(), 3);
    }

    #[test]
    fn execute_emits_camera_setup_then_draws_in_order() {
        let mut renderer = Renderer::new("forward");
        let mut backend = DummyBackend::new();
        let camera = CameraData {
            draw_skybox: true,
            ..test_camera_data(CameraRenderType::Base)
        };
        let data = test_rendering_data(camera);

        renderer.begin_camera(&data.camera);
        renderer.execute(&mut backend, &data);

        // Camera state precedes all draws: the before-rendering block is
        // empty, so the first op is the camera setup.
        assert!(matches!(backend.ops()[0], BackendOp::SetCameraUniforms(_)));
        assert_eq!(
            backend.draw_labels(),
            vec!["draw_opaque_objects", "draw_skybox", "draw_transparent_objects"]
        );

        // The queue drains after the camera.
        assert_eq!(renderer.queued_pass_count(), 0);
    }

    #[test]
    fn shadow_passes_run_before_camera_setup() {
        let mut renderer = Renderer::new("forward");
        renderer.add_feature(Box::new(TaggedFeature {
            label: "shadow_feature",
            event: RenderPassEvent::BeforeShadows,
            active: true,
        }));

        let mut backend = DummyBackend::new();
        let data = test_rendering_data(test_camera_data(CameraRenderType::Base));

        renderer.begin_camera(&data.camera);
        renderer.execute(&mut backend, &data);

        let setup_position = backend
            .ops()
            .iter()
            .position(|op| matches!(op, BackendOp::SetCameraUniforms(_)))
            .unwrap();
        let shadow_position = backend
            .ops()
            .iter()
            .position(|op| matches!(op, BackendOp::Draw { label: "shadow_feature" }))
            .unwrap();
        assert!(shadow_position < setup_position);
    }

    #[test]
    fn features_contribute_in_registration_order() {
        let mut renderer = Renderer::new("forward");
        renderer.add_feature(Box::new(TaggedFeature {
            label: "first",
            event: RenderPassEvent::AfterRendering,
            active: true,
        }));
        renderer.add_feature(Box::new(TaggedFeature {
            label: "inactive",
            event: RenderPassEvent::AfterRendering,
            active: false,
        }));
        renderer.add_feature(Box::new(TaggedFeature {
            label: "second",
            event: RenderPassEvent::AfterRendering,
            active: true,
        }));

        let mut backend = DummyBackend::new();
        let data = test_rendering_data(test_camera_data(CameraRenderType::Base));

        renderer.begin_camera(&data.camera);
        renderer.execute(&mut backend, &data);

        let labels = backend.draw_labels();
        let first = labels.iter().position(|l| *l == "first").unwrap();
        let second = labels.iter().position(|l| *l == "second").unwrap();
        assert!(first < second);
        assert!(!labels.contains(&"inactive"));
    }

    #[test]
    fn stacked_base_renders_into_intermediate_attachments() {
        let mut renderer = Renderer::new("forward");
        let mut backend = DummyBackend::new();

        // Base camera of a stack with overlays still to come.
        let base = CameraData {
            resolve_final_target: false,
            ..test_camera_data(CameraRenderType::Base)
        };
        let base_data = test_rendering_data(base);
        renderer.begin_camera(&base_data.camera);
        renderer.execute(&mut backend, &base_data);

        let first_switch = backend
            .ops()
            .iter()
            .find_map(|op| match op {
                BackendOp::SetRenderTarget { colors, depth, clear_flags, .. } => {
                    Some((colors.clone(), *depth, *clear_flags))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(first_switch.0, vec![CAMERA_COLOR_TEXTURE]);
        assert_eq!(first_switch.1, Some(CAMERA_DEPTH_TEXTURE));
        assert_eq!(first_switch.2, ClearFlags::ALL);

        // No blit yet; the stack hasn't resolved.
        assert!(!backend.draw_labels().contains(&"final_blit"));
    }

    #[test]
    fn resolving_overlay_inherits_targets_and_blits_to_final_output() {
        let mut renderer = Renderer::new("forward");
        let mut backend = DummyBackend::new();

        let base = CameraData {
            resolve_final_target: false,
            ..test_camera_data(CameraRenderType::Base)
        };
        let base_data = test_rendering_data(base);
        renderer.begin_camera(&base_data.camera);
        renderer.execute(&mut backend, &base_data);
        backend.clear();

        // Last overlay of the stack: composites onto the intermediates the
        // base rendered into, then blits to the final output.
        let overlay = CameraData {
            camera_clear_flags: ClearFlags::empty(),
            clear_depth: false,
            resolve_final_target: true,
            ..test_camera_data(CameraRenderType::Overlay)
        };
        let overlay_data = test_rendering_data(overlay);
        renderer.begin_camera(&overlay_data.camera);
        renderer.execute(&mut backend, &overlay_data);

        // The overlay re-binds the inherited intermediates without any
        // clear, and the frame ends with the blit to the final output.
        assert_eq!(backend.clearing_switch_count(), 0);
        assert_eq!(
            backend.draw_labels(),
            vec!["draw_opaque_objects", "draw_transparent_objects", "final_blit"]
        );

        let last_switch = backend
            .ops()
            .iter()
            .rev()
            .find_map(|op| match op {
                BackendOp::SetRenderTarget { colors, depth, .. } => {
                    Some((colors.clone(), *depth))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(last_switch.0, vec![RenderTargetHandle::FinalOutput]);
        assert_eq!(last_switch.1, None);

        // Stack resolved: the target assignment is released.
        assert_eq!(renderer.active_camera_color, RenderTargetHandle::FinalOutput);
    }
}
