//! Error types for the avatar animation engine.
//!
//! Per-frame animation never fails; these variants only cover the edges
//! where the engine touches the outside world (config files, TTS payloads,
//! avatar images).

/// Top-level error type for the animation engine.
#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    /// Configuration load/save error.
    #[error("config error: {0}")]
    Config(String),

    /// Viseme payload could not be parsed.
    #[error("payload error: {0}")]
    Payload(String),

    /// Avatar image decode or encode error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AnimationError>;
