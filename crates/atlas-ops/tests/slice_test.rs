//! End-to-end slicing from sheet files on disk.

use atlas_core::NormRect;
use atlas_io::ImageData;
use atlas_ops::resize::Filter;
use atlas_ops::slice::{load_sheet, slice_image, SliceOptions};
use atlas_ops::OpsError;

/// RGBA sheet where the left half is red and the right half is blue.
fn two_tone(width: u32, height: u32) -> ImageData {
    let data = (0..height)
        .flat_map(|_| {
            (0..width).flat_map(move |x| {
                if x < width / 2 {
                    [255u8, 0, 0, 255]
                } else {
                    [0u8, 0, 255, 255]
                }
            })
        })
        .collect();
    ImageData::from_u8(width, height, 4, data)
}

// ============================================================================
// PNG sheets
// ============================================================================

#[test]
fn test_slice_png_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("sheet.png");
    let part = dir.path().join("part.png");
    atlas_io::write(&sheet, &two_tone(100, 200)).unwrap();

    let rect = NormRect::new(0.25, 0.75, 0.5, 1.0);
    let bytes = slice_image(&sheet, &part, &rect, &SliceOptions::default()).unwrap();
    assert!(bytes > 0);

    let out = atlas_io::read(&part).unwrap();
    assert_eq!((out.width, out.height), (50, 100));
    assert_eq!(out.channels, 4);

    let px = out.to_u8();
    // First column comes from the red half, last from the blue half
    assert_eq!(&px[0..4], &[255, 0, 0, 255]);
    let last = (50 - 1) * 4;
    assert_eq!(&px[last..last + 4], &[0, 0, 255, 255]);
}

#[test]
fn test_slice_with_resize() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("sheet.png");
    let part = dir.path().join("part.png");
    atlas_io::write(&sheet, &two_tone(100, 200)).unwrap();

    let rect = NormRect::new(0.25, 0.75, 0.5, 1.0);
    let options = SliceOptions::default()
        .with_resize(true)
        .with_filter(Filter::Bilinear);
    slice_image(&sheet, &part, &rect, &options).unwrap();

    let out = atlas_io::read(&part).unwrap();
    assert_eq!((out.width, out.height), (64, 128));
}

#[test]
fn test_rgb_sheet_becomes_rgba() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("rgb.png");
    let part = dir.path().join("part.png");
    let rgb = ImageData::from_u8(4, 4, 3, vec![10; 4 * 4 * 3]);
    atlas_io::write(&sheet, &rgb).unwrap();

    let rect = NormRect::new(0.0, 0.5, 0.0, 0.5);
    slice_image(&sheet, &part, &rect, &SliceOptions::default()).unwrap();

    let out = atlas_io::read(&part).unwrap();
    assert_eq!(out.channels, 4);
    assert_eq!(out.to_u8(), [10u8, 10, 10, 255].repeat(4));
}

// ============================================================================
// BLP sheets
// ============================================================================

#[test]
fn test_slice_blp_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("Sheet.blp");
    let part = dir.path().join("part.png");
    atlas_io::write(&sheet, &two_tone(16, 8)).unwrap();

    let loaded = load_sheet(&sheet).unwrap();
    assert_eq!((loaded.width, loaded.height), (16, 8));
    assert!(loaded.is_rgba8());

    let rect = NormRect::new(0.5, 1.0, 0.0, 1.0);
    slice_image(&sheet, &part, &rect, &SliceOptions::default()).unwrap();

    let out = atlas_io::read(&part).unwrap();
    assert_eq!((out.width, out.height), (8, 8));
    assert_eq!(out.to_u8(), [0u8, 0, 255, 255].repeat(64));
}

#[test]
fn test_write_blp_part() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("sheet.png");
    let part = dir.path().join("part.blp");
    atlas_io::write(&sheet, &two_tone(8, 8)).unwrap();

    let rect = NormRect::new(0.0, 0.5, 0.0, 0.5);
    slice_image(&sheet, &part, &rect, &SliceOptions::default()).unwrap();

    let out = atlas_io::read(&part).unwrap();
    assert_eq!((out.width, out.height), (4, 4));
    assert_eq!(out.to_rgba8().unwrap(), [255u8, 0, 0, 255].repeat(16));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_rect_outside_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("sheet.png");
    let part = dir.path().join("part.png");
    atlas_io::write(&sheet, &two_tone(8, 8)).unwrap();

    let rect = NormRect::new(1.5, 2.0, 0.0, 1.0);
    let err = slice_image(&sheet, &part, &rect, &SliceOptions::default()).unwrap_err();
    assert!(matches!(err, OpsError::DegenerateCrop { .. }));
    assert!(!part.exists());
}

#[test]
fn test_missing_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let rect = NormRect::new(0.0, 1.0, 0.0, 1.0);
    let err = slice_image(
        dir.path().join("nope.png"),
        dir.path().join("part.png"),
        &rect,
        &SliceOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, OpsError::Io(_)));
}
