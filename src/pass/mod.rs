//! Render pass model.
//!
//! A render pass is one discrete unit of rendering work: it declares a
//! priority event, the attachments it writes, and a clear policy, and it
//! records opaque draw work through the backend when executed. Passes are
//! contributed by the renderer and its features each frame; the queue is
//! rebuilt every camera and drained after execution.

pub mod draw;

use crate::backend::RenderBackend;
use crate::pipeline::RenderingData;
use crate::types::{ClearFlags, Color, RenderTargetDescriptor, RenderTargetHandle};

/// Maximum number of simultaneous color attachments a pass may declare.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Controls when a render pass executes.
///
/// Values are ordered; the scheduler sorts passes by event and partitions
/// them into coarse execution blocks at fixed thresholds. The gaps between
/// values leave room for injecting work between the built-in points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum RenderPassEvent {
    /// Before anything else in the camera. Executes in the first block,
    /// where camera state is not yet bound.
    BeforeRendering = 0,
    BeforeShadows = 50,
    AfterShadows = 100,
    /// First event of the main rendering blocks. Passes at or after this
    /// point execute with camera state bound.
    BeforePrepasses = 150,
    AfterPrepasses = 200,
    BeforeOpaques = 250,
    AfterOpaques = 300,
    BeforeSkybox = 350,
    AfterSkybox = 400,
    BeforeTransparents = 450,
    AfterTransparents = 500,
    BeforePostProcess = 550,
    AfterPostProcess = 600,
    /// After everything, e.g. UI and overlays.
    AfterRendering = 1000,
}

/// Declared attachment set and clear policy of a render pass.
///
/// By default a pass renders to the camera target with no clearing; passes
/// that render offscreen call one of the `configure_*` methods, which also
/// marks the pass as overriding the camera target.
#[derive(Debug, Clone, PartialEq)]
pub struct PassAttachments {
    /// Declared color attachments. Slot 0 is the primary target. For
    /// depth-only passes the depth texture is declared as the single color
    /// attachment and handled underneath.
    pub colors: [Option<RenderTargetHandle>; MAX_COLOR_ATTACHMENTS],
    /// Declared depth attachment.
    pub depth: RenderTargetHandle,
    /// What the pass wants cleared when its attachments are bound. Only
    /// consulted after the camera target's own first-use clear has been
    /// resolved.
    pub clear_flags: ClearFlags,
    /// Clear color used when `clear_flags` contains `COLOR`.
    pub clear_color: Color,
    /// True when the pass declared its own attachments instead of rendering
    /// to the camera target.
    pub overrides_camera_target: bool,
}

impl Default for PassAttachments {
    fn default() -> Self {
        let mut colors = [None; MAX_COLOR_ATTACHMENTS];
        colors[0] = Some(RenderTargetHandle::FinalOutput);
        Self {
            colors,
            depth: RenderTargetHandle::FinalOutput,
            clear_flags: ClearFlags::empty(),
            clear_color: Color::BLACK,
            overrides_camera_target: false,
        }
    }
}

impl PassAttachments {
    /// Declare a single color attachment and a depth attachment.
    pub fn configure_target(&mut self, color: RenderTargetHandle, depth: RenderTargetHandle) {
        self.colors = [None; MAX_COLOR_ATTACHMENTS];
        self.colors[0] = Some(color);
        self.depth = depth;
        self.overrides_camera_target = true;
    }

    /// Declare multiple color attachments and a depth attachment.
    ///
    /// Extra entries beyond [`MAX_COLOR_ATTACHMENTS`] are ignored.
    pub fn configure_targets(&mut self, colors: &[RenderTargetHandle], depth: RenderTargetHandle) {
        self.colors = [None; MAX_COLOR_ATTACHMENTS];
        for (slot, color) in self.colors.iter_mut().zip(colors.iter()) {
            *slot = Some(*color);
        }
        self.depth = depth;
        self.overrides_camera_target = true;
    }

    /// Set the clear policy used once the camera target's first-use clear
    /// has been resolved.
    pub fn configure_clear(&mut self, flags: ClearFlags, color: Color) {
        self.clear_flags = flags;
        self.clear_color = color;
    }

    /// The primary (slot 0) color attachment.
    #[inline]
    pub fn color_attachment(&self) -> RenderTargetHandle {
        self.colors[0].unwrap_or(RenderTargetHandle::FinalOutput)
    }

    /// Number of declared color attachments.
    pub fn valid_color_count(&self) -> usize {
        self.colors.iter().filter(|c| c.is_some()).count()
    }

    /// True when more than one color attachment is declared.
    #[inline]
    pub fn is_multi_target(&self) -> bool {
        self.valid_color_count() > 1
    }
}

/// A unit of rendering work with a declared priority and target attachments.
///
/// Implementations record GPU work through the backend; the attachment
/// binder has already bound (and, when required, cleared) the declared
/// targets by the time `execute` runs.
pub trait RenderPass {
    /// Pass name for diagnostics and profiling.
    fn name(&self) -> &str;

    /// Priority event controlling when this pass executes.
    fn event(&self) -> RenderPassEvent;

    /// The attachments this pass writes.
    fn attachments(&self) -> &PassAttachments;

    /// Called once per camera before binding, with the camera target
    /// descriptor. Passes that size offscreen targets from the camera
    /// target reconfigure their attachments here.
    fn configure(&mut self, _camera_target: &RenderTargetDescriptor) {}

    /// Record this pass's work. The declared attachments are bound.
    fn execute(&self, backend: &mut dyn RenderBackend, data: &RenderingData);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_ordering() {
        assert!(RenderPassEvent::BeforeRendering < RenderPassEvent::BeforeShadows);
        assert!(RenderPassEvent::BeforeShadows < RenderPassEvent::BeforePrepasses);
        assert!(RenderPassEvent::BeforeOpaques < RenderPassEvent::AfterOpaques);
        assert!(RenderPassEvent::BeforePostProcess < RenderPassEvent::AfterPostProcess);
        assert!(RenderPassEvent::AfterPostProcess < RenderPassEvent::AfterRendering);
    }

    #[test]
    fn default_attachments_target_camera() {
        let atts = PassAttachments::default();
        assert!(!atts.overrides_camera_target);
        assert_eq!(atts.color_attachment(), RenderTargetHandle::FinalOutput);
        assert_eq!(atts.valid_color_count(), 1);
        assert!(!atts.is_multi_target());
    }

    #[test]
    fn configure_target_sets_override() {
        let mut atts = PassAttachments::default();
        atts.configure_target(RenderTargetHandle::texture(7), RenderTargetHandle::texture(8));
        assert!(atts.overrides_camera_target);
        assert_eq!(atts.color_attachment(), RenderTargetHandle::texture(7));
        assert_eq!(atts.depth, RenderTargetHandle::texture(8));
    }

    #[test]
    fn configure_targets_multi() {
        let mut atts = PassAttachments::default();
        atts.configure_targets(
            &[
                RenderTargetHandle::texture(1),
                RenderTargetHandle::texture(2),
                RenderTargetHandle::texture(3),
            ],
            RenderTargetHandle::texture(9),
        );
        assert_eq!(atts.valid_color_count(), 3);
        assert!(atts.is_multi_target());
        assert_eq!(atts.colors[3], None);
    }
}
