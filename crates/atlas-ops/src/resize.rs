//! Image resize and resampling operations.
//!
//! Separable two-pass resampler: rows first, then columns.
//!
//! # Filters
//!
//! - [`Filter::Bilinear`] - Linear interpolation (smooth but blurry)
//! - [`Filter::Bicubic`] - Mitchell-Netravali cubic (default)
//! - [`Filter::Lanczos3`] - Sinc-based, sharpest
//!
//! # Example
//!
//! ```rust
//! use atlas_ops::resize::{resize_f32, Filter};
//!
//! let src: Vec<f32> = vec![0.0; 48 * 20 * 4]; // 48x20 RGBA
//! let dst = resize_f32(&src, 48, 20, 4, 64, 32, Filter::Bicubic).unwrap();
//! assert_eq!(dst.len(), 64 * 32 * 4);
//! ```

use crate::{OpsError, OpsResult};
use std::fmt;
use std::str::FromStr;

/// Resampling filter for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Bilinear interpolation (smooth, fast).
    Bilinear,
    /// Bicubic interpolation (sharper than bilinear).
    #[default]
    Bicubic,
    /// Lanczos-3 (sharpest, may ring).
    Lanczos3,
}

impl Filter {
    /// All filters, for help texts.
    pub const ALL: [Filter; 3] = [Filter::Bilinear, Filter::Bicubic, Filter::Lanczos3];

    /// Returns the support radius for this filter.
    #[inline]
    pub fn support(&self) -> f32 {
        match self {
            Filter::Bilinear => 1.0,
            Filter::Bicubic => 2.0,
            Filter::Lanczos3 => 3.0,
        }
    }

    /// Evaluates the filter kernel at position x.
    #[inline]
    pub fn weight(&self, x: f32) -> f32 {
        match self {
            Filter::Bilinear => bilinear_weight(x),
            Filter::Bicubic => bicubic_weight(x),
            Filter::Lanczos3 => lanczos_weight(x, 3.0),
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Bilinear => "bilinear",
            Filter::Bicubic => "bicubic",
            Filter::Lanczos3 => "lanczos3",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = OpsError;

    fn from_str(s: &str) -> OpsResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bilinear" | "linear" | "triangle" => Ok(Filter::Bilinear),
            "bicubic" | "cubic" | "mitchell" => Ok(Filter::Bicubic),
            "lanczos3" | "lanczos" => Ok(Filter::Lanczos3),
            other => Err(OpsError::InvalidParameter(format!(
                "unknown filter '{}' (expected bilinear, bicubic or lanczos3)",
                other
            ))),
        }
    }
}

/// Bilinear (triangle) weight function.
#[inline]
fn bilinear_weight(x: f32) -> f32 {
    let ax = x.abs();
    if ax < 1.0 { 1.0 - ax } else { 0.0 }
}

/// Bicubic (Mitchell-Netravali) weight function.
#[inline]
fn bicubic_weight(x: f32) -> f32 {
    // B = C = 1/3
    const B: f32 = 1.0 / 3.0;
    const C: f32 = 1.0 / 3.0;

    let ax = x.abs();
    if ax < 1.0 {
        ((12.0 - 9.0 * B - 6.0 * C) * ax * ax * ax
            + (-18.0 + 12.0 * B + 6.0 * C) * ax * ax
            + (6.0 - 2.0 * B))
            / 6.0
    } else if ax < 2.0 {
        ((-B - 6.0 * C) * ax * ax * ax
            + (6.0 * B + 30.0 * C) * ax * ax
            + (-12.0 * B - 48.0 * C) * ax
            + (8.0 * B + 24.0 * C))
            / 6.0
    } else {
        0.0
    }
}

/// Lanczos weight function.
#[inline]
fn lanczos_weight(x: f32, a: f32) -> f32 {
    let ax = x.abs();
    if ax < 1e-8 {
        1.0
    } else if ax < a {
        let pi_x = std::f32::consts::PI * ax;
        let pi_x_a = pi_x / a;
        (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
    } else {
        0.0
    }
}

/// Resizes interleaved f32 image data.
///
/// # Arguments
///
/// * `src` - Source samples, `src_w * src_h * channels` long
/// * `src_w`, `src_h` - Source size
/// * `channels` - Samples per pixel
/// * `dst_w`, `dst_h` - Destination size
/// * `filter` - Resampling filter
pub fn resize_f32(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
    filter: Filter,
) -> OpsResult<Vec<f32>> {
    let expected = src_w * src_h * channels;
    if src.len() != expected {
        return Err(OpsError::InvalidDimensions(format!(
            "expected {} samples, got {}",
            expected,
            src.len()
        )));
    }
    if src_w == 0 || src_h == 0 || channels == 0 {
        return Err(OpsError::InvalidDimensions(format!(
            "source size must be > 0, got {}x{}x{}",
            src_w, src_h, channels
        )));
    }
    if dst_w == 0 || dst_h == 0 {
        return Err(OpsError::InvalidDimensions(
            "destination size must be > 0".into(),
        ));
    }

    let temp = if dst_w == src_w {
        src.to_vec()
    } else {
        resize_horizontal(src, src_w, src_h, channels, dst_w, filter)
    };
    if dst_h == src_h {
        return Ok(temp);
    }
    Ok(resize_vertical(&temp, dst_w, src_h, channels, dst_h, filter))
}

/// Resizes 8-bit samples, rounding and clamping the filtered result.
pub fn resize_u8(
    src: &[u8],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
    filter: Filter,
) -> OpsResult<Vec<u8>> {
    let src: Vec<f32> = src.iter().map(|&v| v as f32).collect();
    let dst = resize_f32(&src, src_w, src_h, channels, dst_w, dst_h, filter)?;
    Ok(dst
        .into_iter()
        .map(|v| v.round().clamp(0.0, 255.0) as u8)
        .collect())
}

/// Contributing source range and weights for one destination sample.
struct Taps {
    first: usize,
    weights: Vec<f32>,
}

/// Precomputes normalized filter taps for every destination position.
fn taps(src_len: usize, dst_len: usize, filter: Filter) -> Vec<Taps> {
    let scale = src_len as f32 / dst_len as f32;
    let stretch = scale.max(1.0);
    let support = filter.support() * stretch;

    (0..dst_len)
        .map(|d| {
            let center = (d as f32 + 0.5) * scale - 0.5;
            let first = ((center - support).floor() as isize).max(0) as usize;
            let last = ((center + support).ceil().max(0.0) as usize).min(src_len - 1);

            let mut weights: Vec<f32> = (first..=last)
                .map(|s| filter.weight((s as f32 - center) / stretch))
                .collect();
            let sum: f32 = weights.iter().sum();
            if sum.abs() > f32::EPSILON {
                weights.iter_mut().for_each(|w| *w /= sum);
            }
            Taps { first, weights }
        })
        .collect()
}

/// Horizontal resize pass.
fn resize_horizontal(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    filter: Filter,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; dst_w * src_h * channels];
    let taps = taps(src_w, dst_w, filter);

    for y in 0..src_h {
        let row = &src[y * src_w * channels..(y + 1) * src_w * channels];
        for (x, t) in taps.iter().enumerate() {
            let out = &mut dst[(y * dst_w + x) * channels..][..channels];
            for (i, &w) in t.weights.iter().enumerate() {
                let px = &row[(t.first + i) * channels..][..channels];
                for c in 0..channels {
                    out[c] += px[c] * w;
                }
            }
        }
    }

    dst
}

/// Vertical resize pass.
fn resize_vertical(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_h: usize,
    filter: Filter,
) -> Vec<f32> {
    let stride = src_w * channels;
    let mut dst = vec![0.0f32; stride * dst_h];
    let taps = taps(src_h, dst_h, filter);

    for (y, t) in taps.iter().enumerate() {
        let out = &mut dst[y * stride..(y + 1) * stride];
        for (i, &w) in t.weights.iter().enumerate() {
            let row = &src[(t.first + i) * stride..][..stride];
            for (o, &s) in out.iter_mut().zip(row) {
                *o += s * w;
            }
        }
    }

    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_filter_weights() {
        assert_abs_diff_eq!(Filter::Bilinear.weight(0.0), 1.0);
        assert_abs_diff_eq!(Filter::Bilinear.weight(0.5), 0.5);
        assert_abs_diff_eq!(Filter::Lanczos3.weight(0.0), 1.0);
        assert_abs_diff_eq!(Filter::Lanczos3.weight(3.5), 0.0);
        // Mitchell: k(0) = (6 - 2B) / 6
        assert_abs_diff_eq!(Filter::Bicubic.weight(0.0), 8.0 / 9.0, epsilon = 1e-6);
        assert_abs_diff_eq!(Filter::Bicubic.weight(2.0), 0.0);
    }

    #[test]
    fn test_filter_names() {
        for f in Filter::ALL {
            assert_eq!(f.name().parse::<Filter>().unwrap(), f);
        }
        assert_eq!("Lanczos".parse::<Filter>().unwrap(), Filter::Lanczos3);
        assert!("nearest".parse::<Filter>().is_err());
        assert_eq!(Filter::default(), Filter::Bicubic);
    }

    #[test]
    fn test_constant_stays_constant() {
        let src = vec![0.5f32; 5 * 3 * 4];
        for f in Filter::ALL {
            let dst = resize_f32(&src, 5, 3, 4, 8, 4, f).unwrap();
            assert_eq!(dst.len(), 8 * 4 * 4);
            for v in dst {
                assert_abs_diff_eq!(v, 0.5, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_same_size_is_identity() {
        let src: Vec<f32> = (0..2 * 2 * 4).map(|v| v as f32).collect();
        assert_eq!(resize_f32(&src, 2, 2, 4, 2, 2, Filter::Bicubic).unwrap(), src);
    }

    #[test]
    fn test_one_axis_only() {
        // Columns are untouched when only the width changes
        let src = vec![0.0, 1.0]; // 1x2 gray
        let dst = resize_f32(&src, 1, 2, 1, 4, 2, Filter::Bicubic).unwrap();
        assert_eq!(dst.len(), 8);
        assert!(dst[..4].iter().all(|&v| v.abs() < 1e-6));
        assert!(dst[4..].iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_downscale_averages() {
        let src: Vec<f32> = (0..8).map(|i| if i % 2 == 0 { 0.0 } else { 1.0 }).collect();
        let dst = resize_f32(&src, 8, 1, 1, 2, 1, Filter::Bilinear).unwrap();
        for v in dst {
            assert_abs_diff_eq!(v, 0.5, epsilon = 0.1);
        }
    }

    #[test]
    fn test_u8_saturated_input_survives() {
        for f in Filter::ALL {
            let white = resize_u8(&[255u8; 3 * 3], 3, 3, 1, 8, 8, f).unwrap();
            assert!(white.iter().all(|&v| v == 255), "{f}");
            let black = resize_u8(&[0u8; 3 * 3], 3, 3, 1, 8, 8, f).unwrap();
            assert!(black.iter().all(|&v| v == 0), "{f}");
        }
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(resize_f32(&[0.0; 3], 2, 2, 1, 4, 4, Filter::Bicubic).is_err());
        assert!(resize_f32(&[0.0; 4], 2, 2, 1, 0, 4, Filter::Bicubic).is_err());
        assert!(resize_f32(&[], 0, 0, 4, 4, 4, Filter::Bicubic).is_err());
    }
}
