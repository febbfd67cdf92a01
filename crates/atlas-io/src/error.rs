//! Error types for texture I/O.

use std::io;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Format not recognized or not handled.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid or truncated file.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// The palettized BLP writer failed.
    ///
    /// Kept apart from [`IoError::EncodeError`] because that path reduces
    /// colors and is best-effort.
    #[error("lossy encode failed: {0}")]
    LossyEncode(String),

    /// Unsupported bit depth or color layout.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(String),
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
