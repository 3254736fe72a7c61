//! # Vantage
//!
//! A frame renderer for real-time 3D pipelines: given cameras and a scene,
//! it decides what to draw, in what order, into which targets, with correct
//! clear/load semantics, every frame.
//!
//! The core is the pass scheduling and target binding subsystem:
//!
//! - [`scheduler`] stable-sorts the per-camera pass queue by event and
//!   partitions it into four execution blocks.
//! - [`renderer::AttachmentBinder`] resolves each pass's concrete
//!   attachments, clears each camera target exactly once per camera, and
//!   skips redundant target switches.
//! - [`pipeline::FramePipeline`] orders cameras, drives camera stacking
//!   (base plus overlay compositing) and runs each camera through its
//!   renderer.
//!
//! GPU command encoding is abstracted behind [`backend::RenderBackend`];
//! [`backend::DummyBackend`] records the operation stream for tests.
//!
//! ## Example
//!
//! ```ignore
//! use vantage::{CameraDescriptor, DummyBackend, FrameInput, FramePipeline, PipelineSettings};
//!
//! let cameras = vec![CameraDescriptor::default()];
//! let mut pipeline = FramePipeline::new(PipelineSettings::default());
//! let mut backend = DummyBackend::new();
//! pipeline.render_frame(&mut backend, &FrameInput::new(&cameras));
//! ```

pub mod backend;
pub mod camera;
pub mod error;
pub mod lights;
pub mod pass;
pub mod pipeline;
pub mod profiling;
pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod types;

// Re-export the main types for convenience.
pub use backend::{BackendOp, DummyBackend, RenderBackend, TargetBinding};
pub use camera::{
    AntialiasingMode, AntialiasingQuality, BackgroundMode, CameraData, CameraDescriptor,
    CameraOverride, CameraRenderType, CameraUniformData, Projection, TargetTexture,
};
pub use error::{RendererError, RendererResult};
pub use lights::{LightData, LightId, LightKind, ShadowData, VisibleLight};
pub use pass::{PassAttachments, RenderPass, RenderPassEvent, MAX_COLOR_ATTACHMENTS};
pub use pipeline::{FrameInput, FramePipeline, PostProcessingData, RenderingData};
pub use renderer::{
    AttachmentBinder, PassQueue, Renderer, RendererFeature, CAMERA_COLOR_TEXTURE,
    CAMERA_DEPTH_TEXTURE,
};
pub use scheduler::{RenderBlock, RenderBlocks, RENDER_BLOCK_COUNT};
pub use settings::{ColorGradingMode, LightRenderingMode, PipelineSettings};
pub use types::{
    ClearFlags, Color, LoadAction, Rect, RenderTargetDescriptor, RenderTargetHandle, StoreAction,
    TextureFormat, TextureId,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the renderer subsystem.
///
/// Optional; only logs the version so startup is visible in traces.
pub fn init() {
    log::info!("vantage renderer v{VERSION} initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn empty_frame_renders() {
        let mut pipeline = FramePipeline::new(PipelineSettings::default());
        let mut backend = DummyBackend::new();
        pipeline.render_frame(&mut backend, &FrameInput::new(&[]));
        assert!(backend.ops().is_empty());
        assert_eq!(pipeline.frame_count(), 1);
    }
}
