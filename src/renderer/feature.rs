//! Pluggable renderer features.
//!
//! A feature extends a renderer with extra passes. Features are registered
//! once at renderer construction and asked to contribute every camera, in
//! registration order; two features enqueueing passes with equal events
//! execute in that same order, because the scheduler's sort is stable.
//!
//! Features own their persistent settings but no per-frame state; the
//! passes they enqueue are dropped when the camera's queue drains.

use crate::camera::CameraData;
use crate::pass::RenderPass;

/// The renderer's pass queue, as exposed to features.
pub struct PassQueue<'a> {
    passes: &'a mut Vec<Box<dyn RenderPass>>,
}

impl<'a> PassQueue<'a> {
    pub(crate) fn new(passes: &'a mut Vec<Box<dyn RenderPass>>) -> Self {
        Self { passes }
    }

    /// Enqueue a pass for this camera.
    pub fn enqueue(&mut self, pass: Box<dyn RenderPass>) {
        self.passes.push(pass);
    }

    /// Number of passes queued so far.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

/// A pluggable contributor of render passes.
///
/// Construction stands in for creation, `Drop` for disposal; between the
/// two, `add_render_passes` runs once per camera per frame while the
/// feature is active.
pub trait RendererFeature {
    /// Feature name for diagnostics.
    fn name(&self) -> &str;

    /// Inactive features are skipped without being consulted.
    fn is_active(&self) -> bool {
        true
    }

    /// Contribute zero or more passes for this camera.
    fn add_render_passes(&mut self, queue: &mut PassQueue<'_>, camera: &CameraData);
}
