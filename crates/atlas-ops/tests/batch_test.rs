//! Batch extraction over a sheet on disk.

use atlas_core::NormRect;
use atlas_info::PartMap;
use atlas_io::ImageData;
use atlas_ops::batch::{extract_all, BatchJob, BatchObserver, NoopObserver, PartOutcome};
use std::fs;
use std::path::Path;

/// Observer that records every callback.
#[derive(Default)]
struct Recorder {
    total: Option<usize>,
    events: Vec<(String, &'static str)>,
}

impl BatchObserver for Recorder {
    fn started(&mut self, total: usize) {
        self.total = Some(total);
    }

    fn part_done(&mut self, name: &str, outcome: &PartOutcome) {
        let kind = match outcome {
            PartOutcome::Written { .. } => "written",
            PartOutcome::Skipped { .. } => "skipped",
            PartOutcome::Failed { .. } => "failed",
        };
        self.events.push((name.to_string(), kind));
    }
}

fn write_sheet(path: &Path) {
    let data = (0..32 * 32)
        .flat_map(|i| [(i % 32 * 8) as u8, (i / 32 * 8) as u8, 0, 255])
        .collect();
    atlas_io::write(path, &ImageData::from_u8(32, 32, 4, data)).unwrap();
}

fn parts() -> PartMap {
    let mut parts = PartMap::new();
    parts.insert("TopLeft", NormRect::new(0.0, 0.5, 0.0, 0.5));
    parts.insert("BottomRight", NormRect::new(0.5, 1.0, 0.5, 1.0));
    parts.insert("Strip", NormRect::new(0.0, 1.0, 0.25, 0.375));
    parts
}

// ============================================================================
// Full runs
// ============================================================================

#[test]
fn test_extracts_every_part() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("Sheet.blp");
    write_sheet(&sheet);
    let parts = parts();
    let out = dir.path().join("output");

    let job = BatchJob::new(&sheet, "Sheet", &parts, &out);
    let mut recorder = Recorder::default();
    let report = extract_all(&job, &mut recorder);

    assert_eq!(report.written, 3);
    assert!(report.is_success());
    assert_eq!(recorder.total, Some(3));
    let names: Vec<&str> = recorder.events.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["TopLeft", "BottomRight", "Strip"]);

    let strip = atlas_io::read(out.join("Sheet").join("Strip.png")).unwrap();
    assert_eq!((strip.width, strip.height), (32, 4));
}

#[test]
fn test_rerun_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("Sheet.png");
    write_sheet(&sheet);
    let parts = parts();
    let out = dir.path().join("output");
    let job = BatchJob::new(&sheet, "Sheet", &parts, &out);

    extract_all(&job, &mut NoopObserver);
    let part = out.join("Sheet").join("TopLeft.png");
    let before = fs::metadata(&part).unwrap().modified().unwrap();

    let mut recorder = Recorder::default();
    let report = extract_all(&job, &mut recorder);

    assert_eq!(report.written, 0);
    assert_eq!(report.skipped, 3);
    assert!(recorder.events.iter().all(|(_, kind)| *kind == "skipped"));
    assert_eq!(fs::metadata(&part).unwrap().modified().unwrap(), before);
}

#[test]
fn test_rerun_skips_without_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("Sheet.png");
    write_sheet(&sheet);
    let parts = parts();
    let out = dir.path().join("output");
    let job = BatchJob::new(&sheet, "Sheet", &parts, &out);
    extract_all(&job, &mut NoopObserver);

    // Everything exists, so the sheet is never opened
    fs::remove_file(&sheet).unwrap();
    let report = extract_all(&job, &mut NoopObserver);
    assert_eq!(report.skipped, 3);
    assert!(report.is_success());
}

#[test]
fn test_fills_in_missing_parts() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("Sheet.png");
    write_sheet(&sheet);
    let parts = parts();
    let out = dir.path().join("output");
    let job = BatchJob::new(&sheet, "Sheet", &parts, &out);
    extract_all(&job, &mut NoopObserver);

    fs::remove_file(out.join("Sheet").join("BottomRight.png")).unwrap();
    let mut recorder = Recorder::default();
    let report = extract_all(&job, &mut recorder);

    assert_eq!((report.written, report.skipped), (1, 2));
    assert_eq!(recorder.events[1], ("BottomRight".to_string(), "written"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_bad_part_does_not_stop_batch() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("Sheet.png");
    write_sheet(&sheet);
    let mut parts = parts();
    parts.insert("Outside", NormRect::new(2.0, 3.0, 2.0, 3.0));
    parts.insert("After", NormRect::new(0.0, 0.25, 0.0, 0.25));
    let out = dir.path().join("output");

    let job = BatchJob::new(&sheet, "Sheet", &parts, &out);
    let report = extract_all(&job, &mut NoopObserver);

    assert_eq!(report.written, 4);
    assert_eq!(report.failed, 1);
    assert!(!report.is_success());
    assert_eq!(report.failures[0].0, "Outside");
    assert!(out.join("Sheet").join("After.png").exists());
    assert!(!out.join("Sheet").join("Outside.png").exists());
}

#[test]
fn test_invalid_record_fails_only_that_part() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("Sheet.png");
    write_sheet(&sheet);
    let mut parts = parts();
    parts.insert_invalid("128-RedButton-Exit", "field 6 is a boolean, expected a number");
    let out = dir.path().join("output");

    let job = BatchJob::new(&sheet, "Sheet", &parts, &out);
    let report = extract_all(&job, &mut NoopObserver);

    assert_eq!((report.written, report.failed), (3, 1));
    assert_eq!(report.failures[0].0, "128-RedButton-Exit");
    assert_eq!(
        report.failures[0].1,
        "invalid record: field 6 is a boolean, expected a number"
    );
    assert!(!out.join("Sheet").join("128-RedButton-Exit.png").exists());
}
