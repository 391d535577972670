//! Error type shared by every stage of the WebP read/write pipeline.

use thiserror::Error;

/// Errors that can occur while adapting, encoding or decoding an image.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The source raster is inconsistent (dimensions, stride, sample depth)
    /// or references a palette entry that does not exist.
    #[error("Invalid pixel data: {0}")]
    InvalidPixelData(String),

    /// The requested compression type is not one of `Lossy` or `Lossless`.
    #[error("Unsupported compression type: {0:?} (expected \"Lossy\" or \"Lossless\")")]
    UnsupportedCompressionType(String),

    /// The requested compression quality is outside `0.0..=1.0`.
    #[error("Invalid compression quality: {0} (must be between 0.0 and 1.0)")]
    InvalidQuality(f32),

    /// libwebp rejected the encode call.
    #[error("WebP encoding failed: {0}")]
    EncodeFailure(String),

    /// libwebp could not decode the bitstream (truncated, bad signature,
    /// unsupported feature).
    #[error("WebP decoding failed: {0}")]
    DecodeFailure(String),

    /// A buffer/dimension precondition failed before reaching the codec.
    #[error("Internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// The image exceeds the configured resource limits.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// Reading from the source or writing to the sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
