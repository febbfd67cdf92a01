//! Format detection utilities.
//!
//! Detects texture formats from file extensions and magic bytes.

use std::path::Path;

/// PNG signature.
const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Texture formats known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// PNG format.
    Png,
    /// Blizzard texture (BLP1 or BLP2 magic; only BLP2 decodes).
    Blp,
    /// Unknown/unsupported format.
    Unknown,
}

impl Format {
    /// Detects format from file extension only.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("png") => Format::Png,
            Some("blp") => Format::Blp,
            _ => Format::Unknown,
        }
    }

    /// Detects format from raw bytes (magic number check).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.starts_with(&PNG_MAGIC) {
            return Format::Png;
        }
        if bytes.starts_with(b"BLP2") || bytes.starts_with(b"BLP1") {
            return Format::Blp;
        }
        Format::Unknown
    }

    /// Short lowercase name, as used for file extensions.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Blp => "blp",
            Format::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Format::from_extension("a/b/sheet.BLP"), Format::Blp);
        assert_eq!(Format::from_extension("part.png"), Format::Png);
        assert_eq!(Format::from_extension("part.jpg"), Format::Unknown);
        assert_eq!(Format::from_extension("noext"), Format::Unknown);
    }

    #[test]
    fn test_from_bytes() {
        assert_eq!(Format::from_bytes(&PNG_MAGIC), Format::Png);
        assert_eq!(Format::from_bytes(b"BLP2\x01\x00\x00\x00"), Format::Blp);
        assert_eq!(Format::from_bytes(b"BL"), Format::Unknown);
    }
}
