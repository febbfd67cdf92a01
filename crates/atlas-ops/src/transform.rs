//! Geometric operations on interleaved sample buffers.

use crate::{OpsError, OpsResult};
use atlas_core::Rect;

/// Copies a rectangular region out of an interleaved buffer.
///
/// Works for any sample type; a palette image is cropped by passing its
/// index plane with `channels = 1`.
///
/// # Example
///
/// ```rust
/// use atlas_core::Rect;
/// use atlas_ops::transform::crop;
///
/// // 3x2 gray image
/// let src = [1u8, 2, 3, 4, 5, 6];
/// let out = crop(&src, 3, 2, 1, Rect::new(1, 0, 2, 2)).unwrap();
/// assert_eq!(out, vec![2, 3, 5, 6]);
/// ```
pub fn crop<T: Copy>(
    src: &[T],
    src_w: usize,
    src_h: usize,
    channels: usize,
    region: Rect,
) -> OpsResult<Vec<T>> {
    if src.len() < src_w * src_h * channels {
        return Err(OpsError::InvalidDimensions(format!(
            "buffer holds {} samples, {}x{}x{} needs {}",
            src.len(),
            src_w,
            src_h,
            channels,
            src_w * src_h * channels
        )));
    }

    let (x, y) = (region.x as usize, region.y as usize);
    let (w, h) = (region.width as usize, region.height as usize);
    if x + w > src_w || y + h > src_h {
        return Err(OpsError::InvalidDimensions(format!(
            "crop region {}x{} at ({},{}) exceeds {}x{}",
            w, h, x, y, src_w, src_h
        )));
    }

    let mut dst = Vec::with_capacity(w * h * channels);
    for row in y..(y + h) {
        let start = (row * src_w + x) * channels;
        dst.extend_from_slice(&src[start..start + w * channels]);
    }

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_rgba() {
        // 4x4 RGBA, pixel value = index
        let src: Vec<u16> = (0..16).flat_map(|i| [i, i, i, i]).collect();
        let out = crop(&src, 4, 4, 4, Rect::new(1, 2, 2, 2)).unwrap();
        let firsts: Vec<u16> = out.chunks(4).map(|p| p[0]).collect();
        assert_eq!(firsts, vec![9, 10, 13, 14]);
    }

    #[test]
    fn test_crop_full_and_edges() {
        let src = [1.0f32, 2.0, 3.0, 4.0];
        assert_eq!(crop(&src, 2, 2, 1, Rect::new(0, 0, 2, 2)).unwrap(), src.to_vec());
        assert_eq!(crop(&src, 2, 2, 1, Rect::new(1, 1, 1, 1)).unwrap(), vec![4.0]);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let src = [0u8; 4];
        assert!(crop(&src, 2, 2, 1, Rect::new(1, 0, 2, 1)).is_err());
        assert!(crop(&src, 4, 4, 1, Rect::new(0, 0, 1, 1)).is_err());
    }
}
