//! Error types for slicing operations.

use atlas_core::PixelBounds;
use atlas_io::IoError;
use thiserror::Error;

/// Error type for slicing operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// The crop rectangle has no area once clamped to the image.
    #[error("crop {bounds} is empty in a {width}x{height} image")]
    DegenerateCrop {
        /// Requested pixel edges, before clamping.
        bounds: PixelBounds,
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Decoding or encoding failed.
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Result type for slicing operations.
pub type OpsResult<T> = Result<T, OpsError>;
