//! File-level tests for format detection, PNG and BLP2.

use atlas_io::{open, read, write, write_with_options, Format, ImageData, IoError, WriteOptions};
use std::fs;

fn checker(width: u32, height: u32) -> ImageData {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let on = (x / 2 + y / 2) % 2 == 0;
            data.extend_from_slice(if on { &[200, 40, 40, 255] } else { &[20, 20, 160, 64] });
        }
    }
    ImageData::from_u8(width, height, 4, data)
}

// ============================================================================
// PNG
// ============================================================================

#[test]
fn test_png_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("part.png");
    let image = checker(8, 6);

    let written = write(&path, &image).unwrap();
    assert_eq!(written, fs::metadata(&path).unwrap().len());

    let loaded = read(&path).unwrap();
    assert_eq!((loaded.width, loaded.height, loaded.channels), (8, 6, 4));
    assert_eq!(loaded.to_u8(), image.to_u8());
}

#[test]
fn test_png_levels_same_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let image = checker(32, 32);

    for level in [0u8, 1, 3, 6, 9] {
        let path = dir.path().join(format!("level{level}.png"));
        write_with_options(&path, &image, &WriteOptions { compression: level }).unwrap();
        assert_eq!(read(&path).unwrap().to_u8(), image.to_u8(), "level {level}");
    }
}

#[test]
fn test_png_has_no_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single.png");
    write(&path, &checker(4, 4)).unwrap();

    let source = open(&path).unwrap();
    assert_eq!(source.frame_count(), None);
    assert_eq!(source.decode_frame(0).unwrap().width, 4);
}

// ============================================================================
// BLP
// ============================================================================

#[test]
fn test_blp_write_then_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("part.blp");
    let image = checker(8, 8);

    write(&path, &image).unwrap();
    assert_eq!(Format::from_bytes(&fs::read(&path).unwrap()), Format::Blp);

    let source = open(&path).unwrap();
    assert_eq!(source.frame_count(), Some(1));

    // Two colors fit the palette exactly, alpha is stored at 8 bits
    let decoded = source.decode_frame(0).unwrap();
    assert_eq!(decoded.to_rgba8().unwrap(), image.to_u8());
}

#[test]
fn test_blp_many_colors_is_lossy_but_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradient.blp");

    let (w, h) = (64u32, 64u32);
    let mut data = Vec::new();
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]);
        }
    }
    let image = ImageData::from_u8(w, h, 4, data.clone());
    write(&path, &image).unwrap();

    let decoded = read(&path).unwrap().to_rgba8().unwrap();
    let max_err = decoded
        .iter()
        .zip(&data)
        .map(|(a, b)| (*a as i32 - *b as i32).abs())
        .max()
        .unwrap();
    assert!(max_err <= 32, "max error {max_err}");
}

#[test]
fn test_magic_beats_extension() {
    let dir = tempfile::tempdir().unwrap();
    let blp_path = dir.path().join("sheet.blp");
    write(&blp_path, &checker(4, 4)).unwrap();

    let renamed = dir.path().join("sheet.png");
    fs::rename(&blp_path, &renamed).unwrap();
    assert_eq!(read(&renamed).unwrap().width, 4);

    // An empty file falls back to its extension
    let empty = dir.path().join("empty.blp");
    fs::write(&empty, b"").unwrap();
    assert!(matches!(open(&empty), Err(IoError::InvalidFile(_))));
}

#[test]
fn test_unknown_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "hello").unwrap();
    assert!(matches!(open(&path), Err(IoError::UnsupportedFormat(_))));
}
