//! PNG format support.
//!
//! Reading expands palette and low bit-depth images, so every PNG decodes to
//! 8- or 16-bit gray, gray+alpha, RGB or RGBA. Writing is always 8-bit.
//!
//! # Compression
//!
//! Levels 0-9 map onto the encoder presets:
//!
//! | Level | Preset |
//! |-------|--------|
//! | 0 | none |
//! | 1 | fastest |
//! | 2-3 | fast |
//! | 4-6 | balanced |
//! | 7-9 | high |
//!
//! # Example
//!
//! ```rust,ignore
//! use atlas_io::png::{PngReader, PngWriter};
//! use atlas_io::{ImageReader, ImageWriter};
//!
//! let image = PngReader.read("input.png")?;
//! PngWriter::with_compression(9).write("output.png", &image)?;
//! ```

use crate::{FrameSource, ImageData, ImageReader, ImageWriter, IoError, IoResult, Metadata, PixelData, PixelFormat};
use std::io::Cursor;

/// PNG reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngReader;

impl ImageReader for PngReader {
    fn read_from_memory(&self, data: &[u8]) -> IoResult<ImageData> {
        let mut decoder = png::Decoder::new(Cursor::new(data));
        decoder.set_transformations(png::Transformations::EXPAND);

        let mut reader = decoder
            .read_info()
            .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

        let buf_size = reader
            .output_buffer_size()
            .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
        let mut buf = vec![0u8; buf_size];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
        buf.truncate(info.buffer_size());

        let channels = match info.color_type {
            png::ColorType::Grayscale => 1,
            png::ColorType::GrayscaleAlpha => 2,
            png::ColorType::Rgb => 3,
            png::ColorType::Rgba => 4,
            other => {
                return Err(IoError::UnsupportedBitDepth(format!(
                    "{:?} {:?}",
                    other, info.bit_depth
                )));
            }
        };

        let (format, data) = match info.bit_depth {
            png::BitDepth::Eight => (PixelFormat::U8, PixelData::U8(buf)),
            png::BitDepth::Sixteen => (PixelFormat::U16, PixelData::U16(bytes_to_u16(&buf))),
            other => {
                return Err(IoError::UnsupportedBitDepth(format!(
                    "{:?} {:?}",
                    info.color_type, other
                )));
            }
        };

        let metadata = Metadata {
            colorspace: Some("sRGB".to_string()),
            ..Metadata::default()
        };

        Ok(ImageData {
            width: info.width,
            height: info.height,
            channels,
            format,
            data,
            metadata,
        })
    }
}

/// PNG writer.
#[derive(Debug, Clone, Copy)]
pub struct PngWriter {
    compression: u8,
}

impl PngWriter {
    /// Creates a writer with the given compression level (0-9, clamped).
    pub fn with_compression(level: u8) -> Self {
        Self {
            compression: level.min(9),
        }
    }
}

impl Default for PngWriter {
    fn default() -> Self {
        Self::with_compression(crate::DEFAULT_COMPRESSION)
    }
}

impl ImageWriter for PngWriter {
    fn write_to_memory(&self, image: &ImageData) -> IoResult<Vec<u8>> {
        let color_type = match image.channels {
            1 => png::ColorType::Grayscale,
            2 => png::ColorType::GrayscaleAlpha,
            3 => png::ColorType::Rgb,
            4 => png::ColorType::Rgba,
            n => return Err(IoError::EncodeError(format!("unsupported channel count: {}", n))),
        };

        let samples = image.to_u8();
        if samples.len() != image.sample_count() {
            return Err(IoError::EncodeError(format!(
                "expected {} samples for {}x{}x{}, got {}",
                image.sample_count(),
                image.width,
                image.height,
                image.channels,
                samples.len()
            )));
        }

        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, image.width, image.height);
            encoder.set_color(color_type);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(compression_preset(self.compression));

            let mut writer = encoder
                .write_header()
                .map_err(|e| IoError::EncodeError(e.to_string()))?;
            writer
                .write_image_data(&samples)
                .map_err(|e| IoError::EncodeError(e.to_string()))?;
            writer
                .finish()
                .map_err(|e| IoError::EncodeError(e.to_string()))?;
        }

        Ok(out)
    }
}

/// A PNG held in memory; PNG has a single frame.
#[derive(Debug, Clone)]
pub struct PngFile {
    data: Vec<u8>,
}

impl PngFile {
    /// Wraps encoded PNG bytes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl FrameSource for PngFile {
    fn frame_count(&self) -> Option<usize> {
        None
    }

    fn decode_frame(&self, index: usize) -> IoResult<ImageData> {
        if index != 0 {
            return Err(IoError::DecodeError(format!("PNG has no frame {}", index)));
        }
        PngReader.read_from_memory(&self.data)
    }
}

fn compression_preset(level: u8) -> png::Compression {
    match level {
        0 => png::Compression::NoCompression,
        1 => png::Compression::Fastest,
        2..=3 => png::Compression::Fast,
        4..=6 => png::Compression::Balanced,
        _ => png::Compression::High,
    }
}

/// Converts big-endian byte slice to u16 vector.
fn bytes_to_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_rgba(width: u32, height: u32) -> ImageData {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 16) as u8);
                data.push((y * 16) as u8);
                data.push(64);
                data.push(if (x + y) % 2 == 0 { 255 } else { 0 });
            }
        }
        ImageData::from_u8(width, height, 4, data)
    }

    #[test]
    fn test_rgba_roundtrip() {
        let image = gradient_rgba(16, 8);
        let bytes = PngWriter::default().write_to_memory(&image).unwrap();
        let loaded = PngReader.read_from_memory(&bytes).unwrap();

        assert_eq!(loaded.width, 16);
        assert_eq!(loaded.height, 8);
        assert_eq!(loaded.channels, 4);
        assert_eq!(loaded.data, image.data);
    }

    #[test]
    fn test_compression_levels_decode_identically() {
        let image = gradient_rgba(16, 16);
        let sizes: Vec<usize> = (0..=9)
            .map(|level| {
                let bytes = PngWriter::with_compression(level)
                    .write_to_memory(&image)
                    .unwrap();
                let loaded = PngReader.read_from_memory(&bytes).unwrap();
                assert_eq!(loaded.data, image.data, "level {}", level);
                bytes.len()
            })
            .collect();
        // Stored blocks are never smaller than deflated ones
        assert!(sizes[0] >= sizes[9]);
    }

    #[test]
    fn test_frame_source() {
        let image = gradient_rgba(4, 4);
        let bytes = PngWriter::default().write_to_memory(&image).unwrap();
        let file = PngFile::from_bytes(bytes);
        assert_eq!(file.frame_count(), None);
        assert_eq!(file.decode_frame(0).unwrap().width, 4);
        assert!(file.decode_frame(1).is_err());
    }

    #[test]
    fn test_short_data_rejected() {
        let image = ImageData::from_u8(4, 4, 4, vec![0; 8]);
        assert!(matches!(
            PngWriter::default().write_to_memory(&image),
            Err(IoError::EncodeError(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            PngReader.read_from_memory(b"not a png"),
            Err(IoError::DecodeError(_))
        ));
    }
}
