//! Rectangle types for atlas slicing.
//!
//! Atlas tables describe every part as a normalized rectangle. Slicing turns
//! that into pixels in two steps, each with its own type:
//!
//! - [`NormRect`] - edges as fractions (0-1) of the sheet size
//! - [`PixelBounds`] - edges in pixels, signed and unclamped
//! - [`Rect`] - origin + size, known to lie inside an image
//!
//! # Coordinate System
//!
//! All coordinates use the standard image convention:
//! - Origin (0, 0) is at the **top-left** corner
//! - X increases to the right
//! - Y increases downward
//!
//! ```text
//! (0,0) ────────► X
//!   │
//!   │   ┌──────────┐
//!   │   │   Part   │
//!   │   └──────────┘
//!   ▼
//!   Y
//! ```
//!
//! # Usage
//!
//! ```rust
//! use atlas_core::{NormRect, Rect};
//!
//! let part = NormRect::new(0.25, 0.75, 0.5, 1.0);
//! let px = part.to_pixels(100, 200);
//! assert_eq!((px.left, px.right, px.top, px.bottom), (25, 75, 100, 200));
//!
//! let region = px.clamp_to(100, 200).unwrap();
//! assert_eq!(region, Rect::new(25, 100, 50, 100));
//! ```

/// A rectangle in normalized sheet coordinates.
///
/// Field order follows the atlas records: left, right, top, bottom.
/// Values are expected in `[0, 1]` with `left < right` and `top < bottom`,
/// but nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormRect {
    /// Left edge as a fraction of the width.
    pub left: f64,
    /// Right edge as a fraction of the width.
    pub right: f64,
    /// Top edge as a fraction of the height.
    pub top: f64,
    /// Bottom edge as a fraction of the height.
    pub bottom: f64,
}

impl NormRect {
    /// Creates a normalized rectangle from its four edges.
    #[inline]
    pub const fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Converts to pixel edges for an image of `width` x `height`.
    ///
    /// Each edge is `floor(normalized * dimension)`. No clamping happens
    /// here: a rectangle outside `[0, 1]` yields edges outside the image,
    /// and a very thin rectangle may collapse to `left == right`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use atlas_core::NormRect;
    ///
    /// let px = NormRect::new(0.1, 0.5, 0.2, 0.6).to_pixels(10, 10);
    /// assert_eq!((px.left, px.right, px.top, px.bottom), (1, 5, 2, 6));
    /// ```
    #[inline]
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelBounds {
        let w = width as f64;
        let h = height as f64;
        PixelBounds {
            left: (self.left * w).floor() as i64,
            right: (self.right * w).floor() as i64,
            top: (self.top * h).floor() as i64,
            bottom: (self.bottom * h).floor() as i64,
        }
    }
}

impl std::fmt::Display for NormRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.left, self.right, self.top, self.bottom
        )
    }
}

/// Pixel edges produced from a [`NormRect`].
///
/// Half-open on both axes: `left`/`top` are inclusive, `right`/`bottom`
/// exclusive. Signed because the source rectangle may lie partly outside
/// the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelBounds {
    /// Left edge (inclusive).
    pub left: i64,
    /// Right edge (exclusive).
    pub right: i64,
    /// Top edge (inclusive).
    pub top: i64,
    /// Bottom edge (exclusive).
    pub bottom: i64,
}

impl PixelBounds {
    /// Width before clamping, zero when the edges are inverted.
    #[inline]
    pub fn width(&self) -> u64 {
        self.right.saturating_sub(self.left).max(0) as u64
    }

    /// Height before clamping, zero when the edges are inverted.
    #[inline]
    pub fn height(&self) -> u64 {
        self.bottom.saturating_sub(self.top).max(0) as u64
    }

    /// Clamps every edge into `[0, dimension]` and returns the region.
    ///
    /// Returns `None` when nothing of the rectangle is left inside the
    /// image (zero width or height after clamping).
    ///
    /// # Example
    ///
    /// ```rust
    /// use atlas_core::{PixelBounds, Rect};
    ///
    /// let bounds = PixelBounds { left: -10, right: 40, top: 90, bottom: 130 };
    /// assert_eq!(bounds.clamp_to(100, 100), Some(Rect::new(0, 90, 40, 10)));
    /// ```
    pub fn clamp_to(&self, max_width: u32, max_height: u32) -> Option<Rect> {
        let clamp_x = |v: i64| v.clamp(0, max_width as i64) as u32;
        let clamp_y = |v: i64| v.clamp(0, max_height as i64) as u32;

        let (left, right) = (clamp_x(self.left), clamp_x(self.right));
        let (top, bottom) = (clamp_y(self.top), clamp_y(self.bottom));

        if left < right && top < bottom {
            Some(Rect::from_corners(left, top, right, bottom))
        } else {
            None
        }
    }
}

impl std::fmt::Display for PixelBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}) - ({}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// All values are in pixels, with (0, 0) at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: u32,
    /// Y coordinate of the top edge (inclusive)
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from two corner points.
    ///
    /// The points are (x1, y1) top-left and (x2, y2) bottom-right.
    /// If coordinates are swapped, they will be normalized.
    #[inline]
    pub fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        let (min_x, max_x) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (min_y, max_y) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}
