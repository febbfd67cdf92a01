//! # atlas-io
//!
//! Texture I/O for atlas slicing.
//!
//! This crate reads and writes the two formats atlas sheets and their
//! extracted parts use:
//!
//! - **BLP** - Blizzard texture container (BLP2: palette, DXT1/3/5, raw BGRA)
//! - **PNG** - Lossless with alpha support
//!
//! # Architecture
//!
//! - [`ImageReader`] / [`ImageWriter`] - format readers and writers
//! - [`FrameSource`] - containers holding several frames (mip levels)
//! - [`read`] / [`open`] / [`write`] - entry points with format detection
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use atlas_io::{open, write};
//!
//! // Sheet with its mip chain; nothing is decoded yet
//! let source = open("Interface/QuestFrame/QuestFrame.blp")?;
//! let image = source.decode_frame(0)?;
//!
//! write("QuestFrame.png", &image)?;
//! ```
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Layouts |
//! |--------|------|-------|---------|
//! | PNG | Yes | Yes | Gray, GrayA, RGB, RGBA, palette; 8 and 16 bit |
//! | BLP2 | Yes | Yes | Palette + 0/1/4/8-bit alpha, DXT1/3/5, BGRA; writes palette + 8-bit alpha |
//!
//! # Feature Flags
//!
//! - `png` - PNG support (default)
//! - `blp` - BLP support (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;
mod traits;

#[cfg(feature = "blp")]
pub mod blp;
#[cfg(feature = "png")]
pub mod png;
pub mod quantize;

pub use detect::Format;
pub use error::{IoError, IoResult};
pub use traits::{FrameSource, ImageReader, ImageWriter, SingleFrame};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// Default PNG compression level (0-9).
pub const DEFAULT_COMPRESSION: u8 = 9;

/// Options for [`write_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Compression level 0-9. Used by PNG; BLP ignores it.
    pub compression: u8,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: DEFAULT_COMPRESSION,
        }
    }
}

/// Reads the first frame of a texture, auto-detecting the format.
///
/// # Example
///
/// ```rust,ignore
/// let image = atlas_io::read("sheet.blp")?;
/// println!("Size: {}x{}", image.width, image.height);
/// ```
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<ImageData> {
    open(path)?.decode_frame(0)
}

/// Opens a texture as a [`FrameSource`].
///
/// The file is read into memory and closed immediately; decoding happens
/// on [`FrameSource::decode_frame`].
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The format is not supported
/// - The container header is invalid
pub fn open<P: AsRef<Path>>(path: P) -> IoResult<Box<dyn FrameSource>> {
    let path = path.as_ref();
    trace!(path = %path.display(), "atlas_io::open");

    let data = fs::read(path)?;
    let format = match Format::from_bytes(&data) {
        Format::Unknown => Format::from_extension(path),
        known => known,
    };
    debug!(path = %path.display(), format = format.name(), bytes = data.len(), "Opened texture");

    match format {
        #[cfg(feature = "blp")]
        Format::Blp => Ok(Box::new(blp::BlpFile::from_bytes(data)?)),

        #[cfg(feature = "png")]
        Format::Png => Ok(Box::new(png::PngFile::from_bytes(data))),

        _ => Err(unsupported(path)),
    }
}

/// Writes an image with default options, format from the extension.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageData) -> IoResult<u64> {
    write_with_options(path, image, &WriteOptions::default())
}

/// Writes an image, detecting format from extension.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns an error if:
/// - The extension is neither `.png` nor `.blp`
/// - The file cannot be created
/// - Encoding fails ([`IoError::LossyEncode`] for BLP)
pub fn write_with_options<P: AsRef<Path>>(
    path: P,
    image: &ImageData,
    options: &WriteOptions,
) -> IoResult<u64> {
    let path = path.as_ref();
    trace!(path = %path.display(), compression = options.compression, "atlas_io::write");

    let written = match Format::from_extension(path) {
        #[cfg(feature = "png")]
        Format::Png => png::PngWriter::with_compression(options.compression).write(path, image)?,

        #[cfg(feature = "blp")]
        Format::Blp => blp::BlpWriter::new().write(path, image)?,

        _ => return Err(unsupported(path)),
    };

    debug!(path = %path.display(), bytes = written, "Wrote texture");
    Ok(written)
}

fn unsupported(path: &Path) -> IoError {
    IoError::UnsupportedFormat(
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    )
}

/// Image data container for I/O operations.
///
/// Format-agnostic: holds pixel data in one of several layouts along with
/// metadata. For [`PixelData::Indexed`] images `channels` is the layout the
/// palette expands to (3 without alpha, 4 with).
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Number of channels (1 gray, 2 gray+alpha, 3 RGB, 4 RGBA).
    pub channels: u32,
    /// Pixel data format.
    pub format: PixelFormat,
    /// Raw pixel data.
    pub data: PixelData,
    /// Optional metadata.
    pub metadata: Metadata,
}

/// Pixel data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit unsigned integer per channel.
    U8,
    /// 16-bit unsigned integer per channel.
    U16,
    /// 32-bit float per channel.
    F32,
    /// 8-bit palette indices.
    Indexed,
}

/// Raw pixel data storage.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    /// 8-bit unsigned data.
    U8(Vec<u8>),
    /// 16-bit unsigned data.
    U16(Vec<u16>),
    /// 32-bit float data.
    F32(Vec<f32>),
    /// Palette image.
    Indexed {
        /// One palette index per pixel.
        indices: Vec<u8>,
        /// RGB palette entries.
        palette: Vec<[u8; 3]>,
        /// Per-pixel alpha, if the image has any.
        alpha: Option<Vec<u8>>,
    },
}

/// Image metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Color space name (e.g. "sRGB").
    pub colorspace: Option<String>,
    /// Format-specific attributes (e.g. "compression" = "dxt5").
    pub attrs: BTreeMap<String, String>,
}

impl ImageData {
    /// Creates ImageData from u8 pixel data.
    pub fn from_u8(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            format: PixelFormat::U8,
            data: PixelData::U8(data),
            metadata: Metadata::default(),
        }
    }

    /// Creates ImageData from u16 pixel data.
    pub fn from_u16(width: u32, height: u32, channels: u32, data: Vec<u16>) -> Self {
        Self {
            width,
            height,
            channels,
            format: PixelFormat::U16,
            data: PixelData::U16(data),
            metadata: Metadata::default(),
        }
    }

    /// Creates ImageData from f32 pixel data.
    pub fn from_f32(width: u32, height: u32, channels: u32, data: Vec<f32>) -> Self {
        Self {
            width,
            height,
            channels,
            format: PixelFormat::F32,
            data: PixelData::F32(data),
            metadata: Metadata::default(),
        }
    }

    /// Creates a palette image.
    pub fn from_indexed(
        width: u32,
        height: u32,
        indices: Vec<u8>,
        palette: Vec<[u8; 3]>,
        alpha: Option<Vec<u8>>,
    ) -> Self {
        let channels = if alpha.is_some() { 4 } else { 3 };
        Self {
            width,
            height,
            channels,
            format: PixelFormat::Indexed,
            data: PixelData::Indexed {
                indices,
                palette,
                alpha,
            },
            metadata: Metadata::default(),
        }
    }

    /// Returns the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns the total number of samples (pixels * channels).
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * self.channels as usize
    }

    /// Returns `true` if the data is 8-bit RGBA.
    pub fn is_rgba8(&self) -> bool {
        self.channels == 4 && matches!(self.data, PixelData::U8(_))
    }

    /// Converts pixel data to f32 in `[0, 1]`, keeping the channel layout.
    ///
    /// Palette images are expanded first.
    pub fn to_f32(&self) -> Vec<f32> {
        match &self.data {
            PixelData::U8(data) => data.iter().map(|&v| v as f32 / 255.0).collect(),
            PixelData::U16(data) => data.iter().map(|&v| v as f32 / 65535.0).collect(),
            PixelData::F32(data) => data.clone(),
            PixelData::Indexed { .. } => self.to_u8().iter().map(|&v| v as f32 / 255.0).collect(),
        }
    }

    /// Converts pixel data to u8, keeping the channel layout.
    ///
    /// Palette images are expanded to RGB or RGBA; out-of-range indices
    /// read as black.
    pub fn to_u8(&self) -> Vec<u8> {
        match &self.data {
            PixelData::U8(data) => data.clone(),
            PixelData::U16(data) => data.iter().map(|&v| (v >> 8) as u8).collect(),
            PixelData::F32(data) => data
                .iter()
                .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
            PixelData::Indexed {
                indices,
                palette,
                alpha,
            } => {
                let mut out = Vec::with_capacity(indices.len() * self.channels as usize);
                for (i, &idx) in indices.iter().enumerate() {
                    let rgb = palette.get(idx as usize).copied().unwrap_or([0, 0, 0]);
                    out.extend_from_slice(&rgb);
                    if let Some(alpha) = alpha {
                        out.push(alpha.get(i).copied().unwrap_or(255));
                    }
                }
                out
            }
        }
    }

    /// Converts to 8-bit RGBA samples.
    ///
    /// Gray is replicated to RGB; missing alpha becomes opaque.
    pub fn to_rgba8(&self) -> IoResult<Vec<u8>> {
        let src = self.to_u8();
        let n = self.pixel_count();
        let channels = self.channels as usize;

        if src.len() < n * channels {
            return Err(IoError::InvalidFile(format!(
                "pixel buffer holds {} samples, {}x{}x{} needs {}",
                src.len(),
                self.width,
                self.height,
                channels,
                n * channels
            )));
        }

        let rgba = match channels {
            4 => {
                let mut src = src;
                src.truncate(n * 4);
                src
            }
            3 => src
                .chunks_exact(3)
                .take(n)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            2 => src
                .chunks_exact(2)
                .take(n)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            1 => src.iter().take(n).flat_map(|&g| [g, g, g, 255]).collect(),
            other => {
                return Err(IoError::UnsupportedBitDepth(format!(
                    "{} channels",
                    other
                )));
            }
        };

        Ok(rgba)
    }
}
