//! BLP (Blizzard texture) format support.
//!
//! Game interface art ships as BLP2 files holding up to 16 mip levels.
//! Frame 0 is the full resolution image.
//!
//! # Features
//!
//! - Palette images with 0, 1, 4 or 8-bit alpha
//! - DXT1 (with or without 1-bit alpha), DXT3 and DXT5
//! - Uncompressed BGRA
//! - Writing: palette + 8-bit alpha, no mips
//!
//! BLP1 and JPEG-compressed BLP2 are rejected as unsupported.
//!
//! # Format Details
//!
//! All integers are little-endian.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | magic `BLP2` |
//! | 4 | 4 | content type (0 JPEG, 1 direct) |
//! | 8 | 1 | encoding (1 palette, 2 DXT, 3 BGRA) |
//! | 9 | 1 | alpha depth in bits |
//! | 10 | 1 | alpha type (DXT: 0 DXT1, 1 DXT3, 7 DXT5) |
//! | 11 | 1 | has mips |
//! | 12 | 8 | width, height |
//! | 20 | 64 | mip offsets |
//! | 84 | 64 | mip sizes |
//! | 148 | 1024 | palette, 256 BGRA entries |
//!
//! Palette mip data is one index byte per pixel followed by the alpha
//! plane, packed least significant bits first.
//!
//! # Example
//!
//! ```rust,ignore
//! use atlas_io::blp;
//! use atlas_io::FrameSource;
//!
//! let file = blp::BlpFile::open("Interface/QuestFrame/QuestFrame.blp")?;
//! println!("{} mips", file.frame_count().unwrap_or(1));
//! let image = file.decode_frame(0)?;
//! ```

use crate::quantize::{self, Quantized};
use crate::{FrameSource, ImageData, ImageReader, ImageWriter, IoError, IoResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use image_dds::{ImageFormat, Surface};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::{debug, trace};

// === Constants ===

/// Number of mip slots in the header.
pub const MAX_MIPS: usize = 16;

/// Size of the fixed header, without the palette.
const HEADER_SIZE: usize = 148;

/// Header plus palette; where palette images written here put their data.
const DATA_OFFSET: usize = HEADER_SIZE + 256 * 4;

/// Pixel encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// 8-bit palette indices plus an alpha plane.
    Palette,
    /// S3TC blocks.
    Dxt,
    /// 32-bit BGRA.
    Bgra,
}

impl Encoding {
    fn from_u8(v: u8) -> IoResult<Self> {
        match v {
            1 => Ok(Encoding::Palette),
            2 => Ok(Encoding::Dxt),
            3 => Ok(Encoding::Bgra),
            other => Err(IoError::UnsupportedFormat(format!("BLP2 encoding {}", other))),
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Encoding::Palette => 1,
            Encoding::Dxt => 2,
            Encoding::Bgra => 3,
        }
    }
}

/// S3TC variant of a DXT-encoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DxtKind {
    /// BC1; `alpha` keeps the punch-through alpha of 3-color blocks.
    Dxt1 {
        /// Whether transparent texels stay transparent.
        alpha: bool,
    },
    /// BC2, explicit 4-bit alpha.
    Dxt3,
    /// BC3, interpolated alpha.
    Dxt5,
}

impl DxtKind {
    fn image_format(self) -> ImageFormat {
        match self {
            DxtKind::Dxt1 { .. } => ImageFormat::BC1RgbaUnorm,
            DxtKind::Dxt3 => ImageFormat::BC2RgbaUnorm,
            DxtKind::Dxt5 => ImageFormat::BC3RgbaUnorm,
        }
    }

    /// Short lowercase name, e.g. `dxt5`.
    pub fn name(self) -> &'static str {
        match self {
            DxtKind::Dxt1 { .. } => "dxt1",
            DxtKind::Dxt3 => "dxt3",
            DxtKind::Dxt5 => "dxt5",
        }
    }
}

/// Parsed BLP2 header.
#[derive(Debug, Clone, PartialEq)]
pub struct BlpHeader {
    /// Pixel encoding.
    pub encoding: Encoding,
    /// Alpha bits per pixel (0, 1, 4 or 8).
    pub alpha_depth: u8,
    /// Alpha type; selects the DXT variant.
    pub alpha_type: u8,
    /// Whether the mip chain is populated.
    pub has_mips: bool,
    /// Width of frame 0.
    pub width: u32,
    /// Height of frame 0.
    pub height: u32,
    /// Byte offset of each mip level.
    pub mip_offsets: [u32; MAX_MIPS],
    /// Byte length of each mip level.
    pub mip_sizes: [u32; MAX_MIPS],
}

impl BlpHeader {
    /// Reads the header fields after the magic.
    fn read<R: Read>(r: &mut R) -> IoResult<Self> {
        let content = r.read_u32::<LittleEndian>()?;
        if content == 0 {
            return Err(IoError::UnsupportedFormat("BLP2 with JPEG content".into()));
        }

        let encoding = Encoding::from_u8(r.read_u8()?)?;
        let alpha_depth = r.read_u8()?;
        let alpha_type = r.read_u8()?;
        let has_mips = r.read_u8()? != 0;
        let width = r.read_u32::<LittleEndian>()?;
        let height = r.read_u32::<LittleEndian>()?;

        let mut mip_offsets = [0u32; MAX_MIPS];
        r.read_u32_into::<LittleEndian>(&mut mip_offsets)?;
        let mut mip_sizes = [0u32; MAX_MIPS];
        r.read_u32_into::<LittleEndian>(&mut mip_sizes)?;

        if width == 0 || height == 0 {
            return Err(IoError::InvalidFile(format!(
                "BLP2 has zero dimension: {}x{}",
                width, height
            )));
        }

        Ok(Self {
            encoding,
            alpha_depth,
            alpha_type,
            has_mips,
            width,
            height,
            mip_offsets,
            mip_sizes,
        })
    }

    fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(b"BLP2")?;
        w.write_u32::<LittleEndian>(1)?;
        w.write_u8(self.encoding.as_u8())?;
        w.write_u8(self.alpha_depth)?;
        w.write_u8(self.alpha_type)?;
        w.write_u8(self.has_mips as u8)?;
        w.write_u32::<LittleEndian>(self.width)?;
        w.write_u32::<LittleEndian>(self.height)?;
        for &o in &self.mip_offsets {
            w.write_u32::<LittleEndian>(o)?;
        }
        for &s in &self.mip_sizes {
            w.write_u32::<LittleEndian>(s)?;
        }
        Ok(())
    }

    /// Dimensions of a mip level.
    pub fn mip_dimensions(&self, level: usize) -> (u32, u32) {
        let shift = level.min(31) as u32;
        ((self.width >> shift).max(1), (self.height >> shift).max(1))
    }

    /// DXT variant: by alpha type, else by alpha depth.
    pub fn dxt_kind(&self) -> DxtKind {
        match self.alpha_type {
            0 => DxtKind::Dxt1 {
                alpha: self.alpha_depth > 0,
            },
            1 => DxtKind::Dxt3,
            7 => DxtKind::Dxt5,
            _ if self.alpha_depth <= 1 => DxtKind::Dxt1 {
                alpha: self.alpha_depth > 0,
            },
            _ => DxtKind::Dxt3,
        }
    }
}

/// A BLP2 file held in memory.
#[derive(Debug, Clone)]
pub struct BlpFile {
    header: BlpHeader,
    /// BGRA entries.
    palette: Vec<[u8; 4]>,
    data: Vec<u8>,
}

impl BlpFile {
    /// Reads and parses a file.
    pub fn open<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        Self::from_bytes(fs::read(path)?)
    }

    /// Parses the header and palette; mip data stays encoded.
    pub fn from_bytes(data: Vec<u8>) -> IoResult<Self> {
        if data.starts_with(b"BLP1") {
            return Err(IoError::UnsupportedFormat("BLP1".into()));
        }
        if !data.starts_with(b"BLP2") {
            return Err(IoError::InvalidFile("missing BLP2 magic".into()));
        }
        if data.len() < DATA_OFFSET {
            return Err(IoError::InvalidFile(format!(
                "BLP2 header truncated: {} bytes",
                data.len()
            )));
        }

        let mut cursor = Cursor::new(&data[4..]);
        let header = BlpHeader::read(&mut cursor)?;

        let palette = data[HEADER_SIZE..DATA_OFFSET]
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();

        trace!(
            width = header.width,
            height = header.height,
            encoding = ?header.encoding,
            alpha_depth = header.alpha_depth,
            "BlpFile::from_bytes"
        );

        Ok(Self {
            header,
            palette,
            data,
        })
    }

    /// The parsed header.
    pub fn header(&self) -> &BlpHeader {
        &self.header
    }

    /// Encoded bytes of one mip level.
    fn mip_data(&self, level: usize) -> IoResult<&[u8]> {
        if level >= MAX_MIPS {
            return Err(IoError::DecodeError(format!("mip level {} out of range", level)));
        }
        let offset = self.header.mip_offsets[level] as usize;
        let size = self.header.mip_sizes[level] as usize;
        if offset == 0 || size == 0 {
            return Err(IoError::DecodeError(format!("mip level {} is absent", level)));
        }
        offset
            .checked_add(size)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| {
                IoError::InvalidFile(format!(
                    "mip level {} ({} bytes at {}) exceeds file size {}",
                    level,
                    size,
                    offset,
                    self.data.len()
                ))
            })
    }

    fn decode_palette(&self, src: &[u8], width: u32, height: u32) -> IoResult<ImageData> {
        let n = sized(width, height, 1)?;
        let depth = self.header.alpha_depth;
        let alpha_len = match depth {
            0 | 1 | 4 | 8 => sized(width, height, depth as usize)?.div_ceil(8),
            other => {
                return Err(IoError::UnsupportedBitDepth(format!(
                    "BLP2 palette alpha depth {}",
                    other
                )));
            }
        };
        let needed = n
            .checked_add(alpha_len)
            .ok_or_else(|| too_large(width, height))?;
        if src.len() < needed {
            return Err(IoError::DecodeError(format!(
                "palette mip too short: {} bytes, need {}",
                src.len(),
                needed
            )));
        }

        let indices = src[..n].to_vec();
        let palette = self.palette.iter().map(|c| [c[2], c[1], c[0]]).collect();
        let alpha = unpack_alpha(&src[n..needed], n, depth);

        Ok(ImageData::from_indexed(width, height, indices, palette, alpha))
    }

    fn decode_bgra(&self, src: &[u8], width: u32, height: u32) -> IoResult<ImageData> {
        let needed = sized(width, height, 4)?;
        if src.len() < needed {
            return Err(IoError::DecodeError(format!(
                "BGRA mip too short: {} bytes, need {}",
                src.len(),
                needed
            )));
        }
        let keep_alpha = self.header.alpha_depth > 0;
        let rgba = src[..needed]
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0], if keep_alpha { p[3] } else { 255 }])
            .collect();
        Ok(ImageData::from_u8(width, height, 4, rgba))
    }

    fn decode_dxt(&self, src: &[u8], width: u32, height: u32) -> IoResult<ImageData> {
        let kind = self.header.dxt_kind();
        sized(width, height, 4)?;

        let surface = Surface {
            width,
            height,
            depth: 1,
            layers: 1,
            mipmaps: 1,
            image_format: kind.image_format(),
            data: src,
        };
        let mut rgba = surface
            .decode_rgba8()
            .map_err(|e| IoError::DecodeError(format!("{} decode error: {e:?}", kind.name())))?
            .data;

        if kind == (DxtKind::Dxt1 { alpha: false }) {
            for px in rgba.chunks_exact_mut(4) {
                px[3] = 255;
            }
        }

        let mut image = ImageData::from_u8(width, height, 4, rgba);
        image.metadata.attrs.insert("dxt".into(), kind.name().into());
        Ok(image)
    }
}

/// Bytes for `width * height * per_pixel`, or `InvalidFile` when it overflows.
fn sized(width: u32, height: u32, per_pixel: usize) -> IoResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(per_pixel))
        .ok_or_else(|| too_large(width, height))
}

fn too_large(width: u32, height: u32) -> IoError {
    IoError::InvalidFile(format!("BLP2 dimensions {}x{} are too large", width, height))
}

impl FrameSource for BlpFile {
    fn frame_count(&self) -> Option<usize> {
        let (w, h) = (self.header.width, self.header.height);
        let possible = (32 - w.max(h).leading_zeros()) as usize;
        let limit = if self.header.has_mips {
            possible.min(MAX_MIPS)
        } else {
            1
        };

        let count = (0..limit)
            .take_while(|&i| self.mip_data(i).is_ok())
            .count();
        (count > 0).then_some(count)
    }

    fn decode_frame(&self, index: usize) -> IoResult<ImageData> {
        let src = self.mip_data(index)?;
        let (width, height) = self.header.mip_dimensions(index);

        let mut image = match self.header.encoding {
            Encoding::Palette => self.decode_palette(src, width, height)?,
            Encoding::Bgra => self.decode_bgra(src, width, height)?,
            Encoding::Dxt => self.decode_dxt(src, width, height)?,
        };

        image.metadata.attrs.insert(
            "compression".into(),
            format!("{:?}", self.header.encoding).to_lowercase(),
        );
        image
            .metadata
            .attrs
            .insert("alpha_depth".into(), self.header.alpha_depth.to_string());

        debug!(index, width, height, encoding = ?self.header.encoding, "Decoded BLP frame");
        Ok(image)
    }
}

/// Expands a packed alpha plane to one byte per pixel.
fn unpack_alpha(packed: &[u8], n: usize, depth: u8) -> Option<Vec<u8>> {
    let alpha = match depth {
        1 => (0..n)
            .map(|i| if (packed[i / 8] >> (i % 8)) & 1 != 0 { 255 } else { 0 })
            .collect(),
        4 => (0..n)
            .map(|i| ((packed[i / 2] >> ((i % 2) * 4)) & 0x0F) * 17)
            .collect(),
        8 => packed[..n].to_vec(),
        _ => return None,
    };
    Some(alpha)
}

/// BLP reader; decodes frame 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlpReader;

impl ImageReader for BlpReader {
    fn read_from_memory(&self, data: &[u8]) -> IoResult<ImageData> {
        BlpFile::from_bytes(data.to_vec())?.decode_frame(0)
    }
}

/// Palettized BLP2 writer.
///
/// Colors are reduced to at most 256 by median cut; alpha is kept at 8 bits.
/// Every failure is reported as [`IoError::LossyEncode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlpWriter;

impl BlpWriter {
    /// Creates a writer.
    pub fn new() -> Self {
        Self
    }

    fn encode(&self, image: &ImageData) -> IoResult<Vec<u8>> {
        if image.width == 0 || image.height == 0 {
            return Err(IoError::EncodeError(format!(
                "cannot encode {}x{} image",
                image.width, image.height
            )));
        }

        let rgba = image.to_rgba8()?;
        let n = image.pixel_count();
        let Quantized { palette, indices } = quantize::median_cut(&rgba, quantize::MAX_COLORS);
        debug!(colors = palette.len(), pixels = n, "Quantized for BLP");

        let mut mip_offsets = [0u32; MAX_MIPS];
        let mut mip_sizes = [0u32; MAX_MIPS];
        mip_offsets[0] = DATA_OFFSET as u32;
        mip_sizes[0] = u32::try_from(n * 2)
            .map_err(|_| IoError::EncodeError("image too large for BLP2".into()))?;

        let header = BlpHeader {
            encoding: Encoding::Palette,
            alpha_depth: 8,
            alpha_type: 8,
            has_mips: false,
            width: image.width,
            height: image.height,
            mip_offsets,
            mip_sizes,
        };

        let mut out = Vec::with_capacity(DATA_OFFSET + n * 2);
        header.write(&mut out)?;
        for i in 0..256 {
            let [r, g, b] = palette.get(i).copied().unwrap_or([0, 0, 0]);
            out.write_all(&[b, g, r, 255])?;
        }
        out.extend_from_slice(&indices);
        out.extend(rgba.chunks_exact(4).map(|p| p[3]));

        Ok(out)
    }
}

impl ImageWriter for BlpWriter {
    fn write_to_memory(&self, image: &ImageData) -> IoResult<Vec<u8>> {
        self.encode(image).map_err(lossy)
    }

    fn write<P: AsRef<Path>>(&self, path: P, image: &ImageData) -> IoResult<u64> {
        let bytes = self.write_to_memory(image)?;
        fs::write(path, &bytes).map_err(|e| lossy(e.into()))?;
        Ok(bytes.len() as u64)
    }
}

fn lossy(e: IoError) -> IoError {
    match e {
        IoError::LossyEncode(_) => e,
        other => IoError::LossyEncode(other.to_string()),
    }
}
