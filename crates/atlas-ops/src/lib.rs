//! # atlas-ops
//!
//! Slicing operations for texture atlases.
//!
//! # Modules
//!
//! - [`slice`] - Frame selection, color normalization, crop, power-of-two resize, encode
//! - [`batch`] - Extract every part of a sheet with skip-existing semantics
//! - [`resize`] - Separable resampler (bilinear, bicubic, Lanczos-3)
//! - [`transform`] - Region copy on interleaved buffers
//!
//! # Example
//!
//! ```rust,ignore
//! use atlas_core::NormRect;
//! use atlas_ops::slice::{slice_image, SliceOptions};
//!
//! let rect = NormRect::new(0.25, 0.75, 0.5, 1.0);
//! let options = SliceOptions::default().with_resize(true);
//! slice_image("sheet.blp", "part.png", &rect, &options)?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod batch;
pub mod resize;
pub mod slice;
pub mod transform;

pub use batch::{extract_all, BatchJob, BatchObserver, BatchReport, PartOutcome};
pub use error::{OpsError, OpsResult};
pub use resize::Filter;
pub use slice::SliceOptions;
