//! Attachment binding.
//!
//! The binder owns the "currently bound" attachment state for one renderer
//! and decides, per pass, which concrete attachments to bind and what to
//! clear. Two invariants drive the logic:
//!
//! - The camera's color and depth targets are each clear-initialized
//!   exactly once per camera, according to the *camera's* clear flags.
//!   Every later pass that touches them falls back to its own declared
//!   clear flags. The two first-use flags are tracked independently.
//! - A bind is only issued when the resolved attachment set or clear
//!   behavior differs from what is currently bound. Tracking bound state
//!   explicitly is what makes the redundant-switch elimination possible.

use crate::backend::{RenderBackend, TargetBinding};
use crate::camera::{CameraData, CameraRenderType};
use crate::pass::{PassAttachments, RenderPassEvent, MAX_COLOR_ATTACHMENTS};
use crate::types::{ClearFlags, Color, LoadAction, RenderTargetHandle, StoreAction};

/// Per-renderer attachment state and bind decision logic.
#[derive(Debug)]
pub struct AttachmentBinder {
    camera_color_target: RenderTargetHandle,
    camera_depth_target: RenderTargetHandle,
    active_colors: [Option<RenderTargetHandle>; MAX_COLOR_ATTACHMENTS],
    active_depth: RenderTargetHandle,
    /// Armed while the camera color target has not been bound this camera.
    /// Only base cameras arm it; overlays must not re-clear the color they
    /// composite onto.
    first_time_color_bound: bool,
    /// Armed while the camera depth target has not been bound this camera.
    /// Re-arms for every camera in a stack, unlike the color flag.
    first_time_depth_bound: bool,
}

impl AttachmentBinder {
    pub fn new() -> Self {
        let mut binder = Self {
            camera_color_target: RenderTargetHandle::FinalOutput,
            camera_depth_target: RenderTargetHandle::FinalOutput,
            active_colors: [None; MAX_COLOR_ATTACHMENTS],
            active_depth: RenderTargetHandle::FinalOutput,
            first_time_color_bound: true,
            first_time_depth_bound: true,
        };
        binder.reset(CameraRenderType::Base);
        binder
    }

    /// Reset bound state at the start of a camera.
    pub fn reset(&mut self, render_type: CameraRenderType) {
        self.active_colors = [None; MAX_COLOR_ATTACHMENTS];
        self.active_colors[0] = Some(RenderTargetHandle::FinalOutput);
        self.active_depth = RenderTargetHandle::FinalOutput;

        self.first_time_color_bound = render_type == CameraRenderType::Base;
        self.first_time_depth_bound = true;

        self.camera_color_target = RenderTargetHandle::FinalOutput;
        self.camera_depth_target = RenderTargetHandle::FinalOutput;
    }

    /// Set the camera's designated color and depth targets.
    pub fn configure_camera_target(
        &mut self,
        color: RenderTargetHandle,
        depth: RenderTargetHandle,
    ) {
        self.camera_color_target = color;
        self.camera_depth_target = depth;
    }

    #[inline]
    pub fn camera_color_target(&self) -> RenderTargetHandle {
        self.camera_color_target
    }

    #[inline]
    pub fn camera_depth_target(&self) -> RenderTargetHandle {
        self.camera_depth_target
    }

    /// Resolve a pass's attachments, clear as required, and bind — unless
    /// the resolved state is already bound.
    pub fn bind_pass_attachments(
        &mut self,
        backend: &mut dyn RenderBackend,
        attachments: &PassAttachments,
        event: RenderPassEvent,
        camera: &CameraData,
    ) {
        // A pass with no valid color attachments keeps the current setup.
        // Depth-only passes declare their depth texture as the single color
        // attachment, so an all-empty set never occurs on a valid pass.
        if attachments.valid_color_count() == 0 {
            return;
        }

        if attachments.is_multi_target() {
            self.bind_multi_target(backend, attachments, camera);
        } else {
            self.bind_single_target(backend, attachments, event, camera);
        }
    }

    fn bind_single_target(
        &mut self,
        backend: &mut dyn RenderBackend,
        attachments: &PassAttachments,
        event: RenderPassEvent,
        camera: &CameraData,
    ) {
        let camera_clear = camera.camera_clear_flags;

        let mut pass_color = attachments.color_attachment();
        let mut pass_depth = attachments.depth;

        if !attachments.overrides_camera_target {
            // Passes in the first block inherit whatever is currently
            // active; camera state is not established yet.
            if event < RenderPassEvent::BeforePrepasses {
                return;
            }

            pass_color = self.camera_color_target;
            pass_depth = self.camera_depth_target;
        }

        let mut final_clear = ClearFlags::empty();
        let final_clear_color;

        if pass_color == self.camera_color_target && self.first_time_color_bound {
            // First write to the camera color buffer this camera: the
            // camera's clear flags win over the pass's.
            self.first_time_color_bound = false;

            final_clear |= camera_clear & ClearFlags::COLOR;
            final_clear_color = camera.background_color;

            if self.first_time_depth_bound {
                // The camera color target can be a combined surface that
                // carries its own depth; both first uses resolve here.
                self.first_time_depth_bound = false;
                final_clear |= camera_clear & ClearFlags::DEPTH;
            }
        } else {
            final_clear |= attachments.clear_flags & ClearFlags::COLOR;
            final_clear_color = attachments.clear_color;
        }

        if !self.camera_depth_target.is_final_output()
            && (pass_depth == self.camera_depth_target
                || pass_color == self.camera_depth_target)
            && self.first_time_depth_bound
        {
            self.first_time_depth_bound = false;
            final_clear |= camera_clear & ClearFlags::DEPTH;
        } else {
            final_clear |= attachments.clear_flags & ClearFlags::DEPTH;
        }

        if Some(pass_color) != self.active_colors[0]
            || pass_depth != self.active_depth
            || !final_clear.is_empty()
        {
            self.set_render_target(backend, pass_color, pass_depth, final_clear, final_clear_color);
        }
    }

    fn bind_multi_target(
        &mut self,
        backend: &mut dyn RenderBackend,
        attachments: &PassAttachments,
        camera: &CameraData,
    ) {
        let camera_clear = camera.camera_clear_flags;

        // Determine which attachments need a clear of their own. A
        // multi-target bind clears all listed attachments identically, so
        // when the camera color target's required clear differs from the
        // pass's it must be cleared separately.
        let mut need_camera_color_clear = false;
        let mut need_camera_depth_clear = false;

        let camera_color_declared = attachments
            .colors
            .iter()
            .flatten()
            .any(|c| *c == self.camera_color_target);

        if camera_color_declared && self.first_time_color_bound {
            self.first_time_color_bound = false;

            need_camera_color_clear = (camera_clear & ClearFlags::COLOR)
                != (attachments.clear_flags & ClearFlags::COLOR)
                || camera.background_color != attachments.clear_color;
        }

        if attachments.depth == self.camera_depth_target && self.first_time_depth_bound {
            self.first_time_depth_bound = false;
            need_camera_depth_clear = (camera_clear & ClearFlags::DEPTH)
                != (attachments.clear_flags & ClearFlags::DEPTH);
        }

        if need_camera_color_clear {
            if camera_clear.contains(ClearFlags::COLOR) {
                // Clear the camera color target separately from the rest.
                self.set_render_target(
                    backend,
                    self.camera_color_target,
                    attachments.depth,
                    ClearFlags::COLOR,
                    camera.background_color,
                );
            }

            if attachments.clear_flags.contains(ClearFlags::COLOR) {
                // The other attachments still want the pass's color clear.
                let expected = attachments
                    .colors
                    .iter()
                    .flatten()
                    .filter(|c| **c != self.camera_color_target)
                    .count();

                let mut trimmed = [RenderTargetHandle::FinalOutput; MAX_COLOR_ATTACHMENTS];
                let mut write_index = 0;
                for color in attachments.colors.iter().flatten() {
                    if *color != self.camera_color_target {
                        trimmed[write_index] = *color;
                        write_index += 1;
                    }
                }

                if write_index != expected {
                    // Scheduler/binder internal corruption, not recoverable
                    // input.
                    log::error!(
                        "color attachment trim mismatch: wrote {write_index}, expected {expected}"
                    );
                    return;
                }

                let depth = self.camera_depth_target;
                self.set_render_target_list(
                    backend,
                    &trimmed[..write_index],
                    depth,
                    ClearFlags::COLOR,
                    attachments.clear_color,
                );
            }
        }

        // Bind all attachments. Clear color only when the camera target
        // didn't need custom handling; clear depth as resolved above.
        let mut final_clear = ClearFlags::empty();
        final_clear |= if need_camera_depth_clear {
            camera_clear & ClearFlags::DEPTH
        } else {
            attachments.clear_flags & ClearFlags::DEPTH
        };
        if !need_camera_color_clear {
            final_clear |= attachments.clear_flags & ClearFlags::COLOR;
        }

        if attachments.colors != self.active_colors
            || attachments.depth != self.active_depth
            || !final_clear.is_empty()
        {
            let mut trimmed = [RenderTargetHandle::FinalOutput; MAX_COLOR_ATTACHMENTS];
            let mut count = 0;
            for color in attachments.colors.iter().flatten() {
                trimmed[count] = *color;
                count += 1;
            }

            self.set_render_target_list(
                backend,
                &trimmed[..count],
                attachments.depth,
                final_clear,
                attachments.clear_color,
            );
        }
    }

    fn set_render_target(
        &mut self,
        backend: &mut dyn RenderBackend,
        color: RenderTargetHandle,
        depth: RenderTargetHandle,
        clear_flags: ClearFlags,
        clear_color: Color,
    ) {
        self.active_colors = [None; MAX_COLOR_ATTACHMENTS];
        self.active_colors[0] = Some(color);
        self.active_depth = depth;

        let colors = [color];
        backend.set_render_target(&TargetBinding {
            colors: &colors,
            // The final output's depth surface is not independently
            // addressable; it rides along with the color target.
            depth: if depth.is_final_output() {
                None
            } else {
                Some(depth)
            },
            clear_flags,
            clear_color,
            color_load: load_action(clear_flags, ClearFlags::COLOR),
            color_store: StoreAction::Store,
            depth_load: load_action(clear_flags, ClearFlags::DEPTH),
            depth_store: StoreAction::Store,
        });
    }

    fn set_render_target_list(
        &mut self,
        backend: &mut dyn RenderBackend,
        colors: &[RenderTargetHandle],
        depth: RenderTargetHandle,
        clear_flags: ClearFlags,
        clear_color: Color,
    ) {
        self.active_colors = [None; MAX_COLOR_ATTACHMENTS];
        for (slot, color) in self.active_colors.iter_mut().zip(colors.iter()) {
            *slot = Some(*color);
        }
        self.active_depth = depth;

        backend.set_render_target(&TargetBinding {
            colors,
            depth: Some(depth),
            clear_flags,
            clear_color,
            color_load: load_action(clear_flags, ClearFlags::COLOR),
            color_store: StoreAction::Store,
            depth_load: load_action(clear_flags, ClearFlags::DEPTH),
            depth_store: StoreAction::Store,
        });
    }
}

impl Default for AttachmentBinder {
    fn default() -> Self {
        Self::new()
    }
}

fn load_action(clear_flags: ClearFlags, part: ClearFlags) -> LoadAction {
    if clear_flags.contains(part) {
        LoadAction::Clear
    } else {
        LoadAction::Load
    }
}
