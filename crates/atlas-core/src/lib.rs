//! # atlas-core
//!
//! Geometry shared by the atlas crates.
//!
//! - [`NormRect`] - a part's rectangle as stored in the atlas table
//! - [`PixelBounds`] - the same rectangle in pixels, before clamping
//! - [`Rect`] - a clamped region inside a concrete image
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies; the others build on it:
//!
//! ```text
//! atlas-core (this crate)
//!    ^
//!    +-- atlas-info (table parsing and lookups)
//!    +-- atlas-ops (slicing)
//!    +-- atlas-cli
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod rect;

pub use rect::{NormRect, PixelBounds, Rect};
