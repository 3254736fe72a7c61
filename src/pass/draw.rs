//! Built-in draw passes.
//!
//! These cover the forward renderer's standard work: opaque geometry, the
//! skybox, and transparent geometry. Their GPU internals are opaque to the
//! scheduler; executing one records a single labeled draw operation through
//! the backend.

use crate::backend::RenderBackend;
use crate::pipeline::RenderingData;
use crate::profiling::ProfilingScope;

use super::{PassAttachments, RenderPass, RenderPassEvent};

/// Draws scene geometry, either the opaque or the transparent range.
pub struct DrawObjectsPass {
    label: &'static str,
    event: RenderPassEvent,
    opaque: bool,
    attachments: PassAttachments,
}

impl DrawObjectsPass {
    /// The opaque geometry pass.
    pub fn opaque() -> Self {
        Self {
            label: "draw_opaque_objects",
            event: RenderPassEvent::BeforeOpaques,
            opaque: true,
            attachments: PassAttachments::default(),
        }
    }

    /// The transparent geometry pass.
    pub fn transparent() -> Self {
        Self {
            label: "draw_transparent_objects",
            event: RenderPassEvent::BeforeTransparents,
            opaque: false,
            attachments: PassAttachments::default(),
        }
    }

    /// True for the opaque variant.
    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }
}

impl RenderPass for DrawObjectsPass {
    fn name(&self) -> &str {
        self.label
    }

    fn event(&self) -> RenderPassEvent {
        self.event
    }

    fn attachments(&self) -> &PassAttachments {
        &self.attachments
    }

    fn execute(&self, backend: &mut dyn RenderBackend, data: &RenderingData) {
        let _scope = ProfilingScope::new(self.label);

        log::trace!(
            "{}: main light {:?}, {} additional lights",
            self.label,
            data.lights.main_light_index,
            data.lights.additional_lights_count
        );
        backend.draw(self.label);
    }
}

/// Draws the camera's skybox background.
pub struct DrawSkyboxPass {
    attachments: PassAttachments,
}

impl DrawSkyboxPass {
    pub fn new() -> Self {
        Self {
            attachments: PassAttachments::default(),
        }
    }
}

impl Default for DrawSkyboxPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for DrawSkyboxPass {
    fn name(&self) -> &str {
        "draw_skybox"
    }

    fn event(&self) -> RenderPassEvent {
        RenderPassEvent::BeforeSkybox
    }

    fn attachments(&self) -> &PassAttachments {
        &self.attachments
    }

    fn execute(&self, backend: &mut dyn RenderBackend, _data: &RenderingData) {
        let _scope = ProfilingScope::new("draw_skybox");
        backend.draw("draw_skybox");
    }
}

/// Copies the stack's intermediate color attachment to the final output.
///
/// Enqueued by the renderer on the camera that resolves a stack rendered
/// through intermediate attachments.
pub struct FinalBlitPass {
    attachments: PassAttachments,
}

impl FinalBlitPass {
    pub fn new() -> Self {
        let mut attachments = PassAttachments::default();
        attachments.configure_target(
            crate::types::RenderTargetHandle::FinalOutput,
            crate::types::RenderTargetHandle::FinalOutput,
        );
        Self { attachments }
    }
}

impl Default for FinalBlitPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for FinalBlitPass {
    fn name(&self) -> &str {
        "final_blit"
    }

    fn event(&self) -> RenderPassEvent {
        RenderPassEvent::AfterRendering
    }

    fn attachments(&self) -> &PassAttachments {
        &self.attachments
    }

    fn execute(&self, backend: &mut dyn RenderBackend, _data: &RenderingData) {
        let _scope = ProfilingScope::new("final_blit");
        backend.draw("final_blit");
    }
}
