//! Renderer error types.
//!
//! Per-camera failures never escape the frame loop: the orchestrator catches
//! them, logs a warning and skips the offending camera. Nothing here is
//! retried; render state is frame-local.

use thiserror::Error;

/// Errors that can occur while rendering a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RendererError {
    /// No renderer is available for the camera.
    #[error("no renderer available for camera '{0}'")]
    MissingRenderer(String),
    /// A camera that is not a base camera was asked to render standalone.
    #[error("camera '{0}' is not a base camera and cannot start a camera stack")]
    NotABaseCamera(String),
    /// Internal invariant violation; indicates renderer corruption.
    #[error("internal renderer error: {0}")]
    Internal(String),
}

/// Convenience alias for renderer results.
pub type RendererResult<T> = Result<T, RendererError>;
