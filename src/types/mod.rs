//! Shared value types: rectangles, colors, render target handles and
//! clear/load semantics.

mod common;
mod target;

pub use common::{Color, Rect};
pub use target::{
    ClearFlags, LoadAction, RenderTargetDescriptor, RenderTargetHandle, StoreAction,
    TextureFormat, TextureId,
};
