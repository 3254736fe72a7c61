//! Render target types.
//!
//! A [`RenderTargetHandle`] is an opaque identifier for something a pass can
//! write to. It resolves to either the camera's final output (backbuffer or
//! the camera's own target texture, resolved by the device layer) or an
//! interim texture owned by the resource layer.

use bitflags::bitflags;

/// Handle to a texture owned by the resource layer.
///
/// `TextureId` is `Copy` and cheap to pass around. The renderer never
/// dereferences it; it only compares handles to decide when a target switch
/// is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Identifies a render target an attachment can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTargetHandle {
    /// The camera's final output. This is the backbuffer, or the camera's
    /// target texture when one is assigned; the distinction is resolved
    /// underneath by the device layer.
    FinalOutput,
    /// An interim texture.
    Texture(TextureId),
}

impl RenderTargetHandle {
    /// Create a handle for an interim texture.
    pub fn texture(id: u64) -> Self {
        Self::Texture(TextureId(id))
    }

    /// Returns true if this handle resolves to the final output.
    #[inline]
    pub fn is_final_output(&self) -> bool {
        matches!(self, Self::FinalOutput)
    }
}

impl Default for RenderTargetHandle {
    fn default() -> Self {
        Self::FinalOutput
    }
}

bitflags! {
    /// Which parts of an attachment set should be cleared when bound.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const ALL = Self::COLOR.bits() | Self::DEPTH.bits();
    }
}

/// Operation performed on an attachment when it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadAction {
    /// Clear the attachment with the binding's clear value.
    Clear,
    /// Load the existing contents of the attachment.
    #[default]
    Load,
}

/// Operation performed on an attachment when the pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreAction {
    /// Store the attachment contents for later use.
    #[default]
    Store,
    /// Contents may be discarded after the pass.
    Discard,
}

/// Texture formats the renderer cares about when deriving camera targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit per channel LDR color.
    Rgba8Unorm,
    /// 16-bit float HDR color.
    Rgba16Float,
    /// 32-bit float depth.
    Depth32Float,
}

impl TextureFormat {
    /// Returns true for depth formats.
    #[inline]
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Depth32Float)
    }
}

/// Describes the camera target a stack renders into.
///
/// Derived once per camera each frame from the camera and pipeline settings;
/// read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// MSAA sample count (1 = no multisampling).
    pub samples: u32,
    pub depth_bits: u32,
}

impl Default for RenderTargetDescriptor {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            format: TextureFormat::Rgba8Unorm,
            samples: 1,
            depth_bits: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_equality() {
        assert_eq!(RenderTargetHandle::FinalOutput, RenderTargetHandle::FinalOutput);
        assert_eq!(RenderTargetHandle::texture(3), RenderTargetHandle::texture(3));
        assert_ne!(RenderTargetHandle::texture(3), RenderTargetHandle::texture(4));
        assert_ne!(RenderTargetHandle::texture(0), RenderTargetHandle::FinalOutput);
    }

    #[test]
    fn final_output_detection() {
        assert!(RenderTargetHandle::FinalOutput.is_final_output());
        assert!(!RenderTargetHandle::texture(1).is_final_output());
    }

    #[test]
    fn clear_flags_composition() {
        assert_eq!(ClearFlags::COLOR | ClearFlags::DEPTH, ClearFlags::ALL);
        assert!(ClearFlags::ALL.contains(ClearFlags::DEPTH));
        assert!(ClearFlags::empty().is_empty());
        assert_eq!(ClearFlags::ALL & ClearFlags::COLOR, ClearFlags::COLOR);
    }

    #[test]
    fn depth_format_detection() {
        assert!(TextureFormat::Depth32Float.is_depth());
        assert!(!TextureFormat::Rgba8Unorm.is_depth());
    }
}
