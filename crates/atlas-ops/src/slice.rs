//! Turning a normalized rectangle and a sheet into a part image.
//!
//! The pipeline for one part:
//!
//! ```text
//! sheet file ─► select_base_frame ─► normalize_color_mode ─► RGBA8 sheet
//!                                                              │
//! NormRect ─► to_pixel_rect ─► crop ◄──────────────────────────┘
//!                               │
//!                               ▼
//!                 resize_to_power_of_two (optional) ─► encode
//! ```
//!
//! [`load_sheet`], [`slice`] and [`slice_image`] bundle these steps.

use crate::resize::{self, Filter};
use crate::transform;
use crate::{OpsError, OpsResult};
use atlas_core::{NormRect, PixelBounds};
use atlas_io::{FrameSource, ImageData, PixelData, WriteOptions};
use std::path::Path;
use tracing::{debug, info, trace};

/// How a part is produced from its sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceOptions {
    /// Scale each dimension up to the next power of two.
    pub resize: bool,
    /// Filter used when resizing.
    pub filter: Filter,
    /// PNG compression level (0-9).
    pub compression: u8,
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self {
            resize: false,
            filter: Filter::default(),
            compression: atlas_io::DEFAULT_COMPRESSION,
        }
    }
}

impl SliceOptions {
    /// Sets power-of-two resizing.
    pub fn with_resize(mut self, resize: bool) -> Self {
        self.resize = resize;
        self
    }

    /// Sets the resampling filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the PNG compression level.
    pub fn with_compression(mut self, level: u8) -> Self {
        self.compression = level;
        self
    }
}

/// Converts any decoded layout to 8-bit RGBA.
///
/// Gray, gray+alpha, RGB, 16-bit, float and palette images are expanded;
/// RGBA8 input is returned as is.
pub fn normalize_color_mode(image: ImageData) -> OpsResult<ImageData> {
    if image.is_rgba8() {
        return Ok(image);
    }

    debug!(
        channels = image.channels,
        format = ?image.format,
        "Converting to RGBA8"
    );
    let rgba = image.to_rgba8()?;
    let mut out = ImageData::from_u8(image.width, image.height, 4, rgba);
    out.metadata = image.metadata;
    Ok(out)
}

/// Decodes the frame a part is cut from.
///
/// Frame 0 is the highest resolution. A source that cannot report its frame
/// count is treated as single-frame; other frames are never decoded.
pub fn select_base_frame(source: &dyn FrameSource) -> OpsResult<ImageData> {
    match source.frame_count() {
        Some(n) if n > 1 => debug!(frames = n, "Multi-frame source, using frame 0"),
        Some(n) => trace!(frames = n, "select_base_frame"),
        None => trace!("Frame count unavailable, using frame 0"),
    }
    Ok(source.decode_frame(0)?)
}

/// Converts a normalized rectangle to pixel edges (floor, no clamping).
pub fn to_pixel_rect(rect: &NormRect, width: u32, height: u32) -> PixelBounds {
    rect.to_pixels(width, height)
}

/// Crops an image to pixel edges, clamped to the image.
///
/// # Errors
///
/// [`OpsError::DegenerateCrop`] when nothing of the rectangle is left after
/// clamping.
pub fn crop(image: &ImageData, bounds: PixelBounds) -> OpsResult<ImageData> {
    let region = bounds
        .clamp_to(image.width, image.height)
        .ok_or(OpsError::DegenerateCrop {
            bounds,
            width: image.width,
            height: image.height,
        })?;

    if region.width as u64 != bounds.width() || region.height as u64 != bounds.height() {
        debug!(%bounds, %region, "Crop clamped to image");
    }

    let (w, h, c) = (
        image.width as usize,
        image.height as usize,
        image.channels as usize,
    );

    let data = match &image.data {
        PixelData::U8(src) => PixelData::U8(transform::crop(src, w, h, c, region)?),
        PixelData::U16(src) => PixelData::U16(transform::crop(src, w, h, c, region)?),
        PixelData::F32(src) => PixelData::F32(transform::crop(src, w, h, c, region)?),
        PixelData::Indexed {
            indices,
            palette,
            alpha,
        } => PixelData::Indexed {
            indices: transform::crop(indices, w, h, 1, region)?,
            palette: palette.clone(),
            alpha: alpha
                .as_ref()
                .map(|a| transform::crop(a, w, h, 1, region))
                .transpose()?,
        },
    };

    Ok(ImageData {
        width: region.width,
        height: region.height,
        channels: image.channels,
        format: image.format,
        data,
        metadata: image.metadata.clone(),
    })
}

/// Smallest power of two `>= n`.
///
/// # Errors
///
/// [`OpsError::InvalidDimensions`] for zero or when the result overflows `u32`.
///
/// ```rust
/// use atlas_ops::slice::next_power_of_two;
///
/// assert_eq!(next_power_of_two(1).unwrap(), 1);
/// assert_eq!(next_power_of_two(50).unwrap(), 64);
/// assert_eq!(next_power_of_two(64).unwrap(), 64);
/// assert!(next_power_of_two(0).is_err());
/// ```
pub fn next_power_of_two(n: u32) -> OpsResult<u32> {
    if n == 0 {
        return Err(OpsError::InvalidDimensions("size 0 has no power of two".into()));
    }
    n.checked_next_power_of_two()
        .ok_or_else(|| OpsError::InvalidDimensions(format!("{} is too large", n)))
}

/// Scales each dimension up to the next power of two.
///
/// An image that is already power-of-two sized is returned unchanged, so
/// applying this twice is the same as applying it once.
pub fn resize_to_power_of_two(image: ImageData, filter: Filter) -> OpsResult<ImageData> {
    let dst_w = next_power_of_two(image.width)?;
    let dst_h = next_power_of_two(image.height)?;
    if (dst_w, dst_h) == (image.width, image.height) {
        return Ok(image);
    }

    debug!(
        from_w = image.width,
        from_h = image.height,
        to_w = dst_w,
        to_h = dst_h,
        %filter,
        "Resizing to power of two"
    );

    let (sw, sh, c) = (
        image.width as usize,
        image.height as usize,
        image.channels as usize,
    );
    let (dw, dh) = (dst_w as usize, dst_h as usize);

    let mut out = match &image.data {
        PixelData::U8(src) => {
            let data = resize::resize_u8(src, sw, sh, c, dw, dh, filter)?;
            ImageData::from_u8(dst_w, dst_h, image.channels, data)
        }
        PixelData::Indexed { .. } => {
            let data = resize::resize_u8(&image.to_u8(), sw, sh, c, dw, dh, filter)?;
            ImageData::from_u8(dst_w, dst_h, image.channels, data)
        }
        PixelData::U16(_) | PixelData::F32(_) => {
            let data = resize::resize_f32(&image.to_f32(), sw, sh, c, dw, dh, filter)?;
            ImageData::from_f32(dst_w, dst_h, image.channels, data)
        }
    };
    out.metadata = image.metadata;
    Ok(out)
}

/// Writes a part image; the format follows the extension (`.png` or `.blp`).
///
/// Returns the number of bytes written.
pub fn encode<P: AsRef<Path>>(image: &ImageData, path: P, compression: u8) -> OpsResult<u64> {
    let options = WriteOptions { compression };
    Ok(atlas_io::write_with_options(path, image, &options)?)
}

/// Opens a sheet, picks its base frame and converts it to RGBA8.
pub fn load_sheet<P: AsRef<Path>>(path: P) -> OpsResult<ImageData> {
    let path = path.as_ref();
    trace!(path = %path.display(), "load_sheet");

    let source = atlas_io::open(path)?;
    let image = select_base_frame(source.as_ref())?;
    let image = normalize_color_mode(image)?;

    debug!(path = %path.display(), width = image.width, height = image.height, "Loaded sheet");
    Ok(image)
}

/// Cuts one part out of a loaded sheet.
pub fn slice(sheet: &ImageData, rect: &NormRect, options: &SliceOptions) -> OpsResult<ImageData> {
    let bounds = to_pixel_rect(rect, sheet.width, sheet.height);
    trace!(%rect, %bounds, "slice");

    let part = crop(sheet, bounds)?;
    if options.resize {
        resize_to_power_of_two(part, options.filter)
    } else {
        Ok(part)
    }
}

/// Runs the whole chain for one part: load, crop, resize, encode.
///
/// Returns the number of bytes written.
pub fn slice_image<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    rect: &NormRect,
    options: &SliceOptions,
) -> OpsResult<u64> {
    let sheet = load_sheet(input.as_ref())?;
    let part = slice(&sheet, rect, options)?;
    let written = encode(&part, output.as_ref(), options.compression)?;

    info!(
        output = %output.as_ref().display(),
        width = part.width,
        height = part.height,
        bytes = written,
        "Wrote part"
    );
    Ok(written)
}
