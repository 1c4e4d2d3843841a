//! Error types shared across the simulation, GPU and recording layers.

/// Errors produced by the ripple overlay
#[derive(Debug, thiserror::Error)]
pub enum RippleError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("GPU unavailable: {0}")]
    GpuUnavailable(String),

    /// The overlay can no longer be presented (surface lost, view torn down)
    #[error("overlay unavailable: {0}")]
    OverlayUnavailable(String),

    #[error("this backend cannot capture frames")]
    CaptureUnsupported,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RippleError>;
