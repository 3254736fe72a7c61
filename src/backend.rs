//! Backend abstraction.
//!
//! The renderer does not encode GPU commands itself; it drives a
//! [`RenderBackend`] with a small set of opaque operations: bind a target
//! set with clear/load semantics, establish camera state, record a draw.
//! Real device backends live outside this crate. [`DummyBackend`] records
//! every operation and is what the test suite and benches run against.

use crate::camera::CameraUniformData;
use crate::types::{ClearFlags, Color, LoadAction, RenderTargetHandle, StoreAction};

/// A target set to bind, with its resolved clear/load/store actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetBinding<'a> {
    /// Color attachments to bind, trimmed to the declared set.
    pub colors: &'a [RenderTargetHandle],
    /// Depth attachment. `None` means the color target carries its own
    /// depth surface (the final output's depth is never bound separately).
    pub depth: Option<RenderTargetHandle>,
    /// Which attachments to clear as part of the bind.
    pub clear_flags: ClearFlags,
    /// Clear color applied when `clear_flags` contains `COLOR`.
    pub clear_color: Color,
    pub color_load: LoadAction,
    pub color_store: StoreAction,
    pub depth_load: LoadAction,
    pub depth_store: StoreAction,
}

/// Interface the renderer drives each frame.
///
/// Implementations translate these calls into device command encoding. All
/// calls happen on the render thread in execution order.
pub trait RenderBackend {
    /// Bind a render target set. Only issued when the resolved attachment
    /// set or clear behavior differs from what is currently bound.
    fn set_render_target(&mut self, binding: &TargetBinding<'_>);

    /// Establish per-camera state (view/projection and derived matrices).
    /// Issued once per camera between the before-rendering block and the
    /// main blocks.
    fn set_camera_uniforms(&mut self, uniforms: &CameraUniformData);

    /// Record an opaque draw operation.
    fn draw(&mut self, label: &'static str);
}

/// One recorded backend operation.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOp {
    SetRenderTarget {
        colors: Vec<RenderTargetHandle>,
        depth: Option<RenderTargetHandle>,
        clear_flags: ClearFlags,
        clear_color: Color,
        color_load: LoadAction,
        depth_load: LoadAction,
    },
    SetCameraUniforms(Box<CameraUniformData>),
    Draw {
        label: &'static str,
    },
}

/// Backend that records operations instead of talking to a device.
///
/// Used by tests and benches to assert on the exact operation stream the
/// renderer produces.
#[derive(Debug, Default)]
pub struct DummyBackend {
    ops: Vec<BackendOp>,
}

impl DummyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// All operations recorded so far, in issue order.
    pub fn ops(&self) -> &[BackendOp] {
        &self.ops
    }

    /// Drop all recorded operations.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Number of target switches issued.
    pub fn target_switch_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, BackendOp::SetRenderTarget { .. }))
            .count()
    }

    /// Number of target switches that cleared at least one attachment.
    pub fn clearing_switch_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| {
                matches!(op, BackendOp::SetRenderTarget { clear_flags, .. } if !clear_flags.is_empty())
            })
            .count()
    }

    /// Labels of recorded draws, in issue order.
    pub fn draw_labels(&self) -> Vec<&'static str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                BackendOp::Draw { label } => Some(*label),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for DummyBackend {
    fn set_render_target(&mut self, binding: &TargetBinding<'_>) {
        self.ops.push(BackendOp::SetRenderTarget {
            colors: binding.colors.to_vec(),
            depth: binding.depth,
            clear_flags: binding.clear_flags,
            clear_color: binding.clear_color,
            color_load: binding.color_load,
            depth_load: binding.depth_load,
        });
    }

    fn set_camera_uniforms(&mut self, uniforms: &CameraUniformData) {
        self.ops.push(BackendOp::SetCameraUniforms(Box::new(*uniforms)));
    }

    fn draw(&mut self, label: &'static str) {
        self.ops.push(BackendOp::Draw { label });
    }
}
