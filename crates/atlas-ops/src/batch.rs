//! Extracting every part of a sheet.
//!
//! Parts are written to `{output_dir}/{sheet_name}/{part}.png` in table
//! order. Existing files are skipped, so a rerun only fills in what is
//! missing. The sheet is decoded on the first part that needs writing and
//! reused for the rest; a run where everything is skipped decodes nothing.
//!
//! A failing part is recorded and the batch moves on.
//!
//! # Example
//!
//! ```rust,ignore
//! use atlas_ops::batch::{extract_all, BatchJob, NoopObserver};
//!
//! let job = BatchJob::new(&sheet_path, sheet.base_name(), &sheet.parts, "output");
//! let report = extract_all(&job, &mut NoopObserver);
//! println!("{} written, {} skipped, {} failed", report.written, report.skipped, report.failed);
//! ```

use crate::slice::{self, SliceOptions};
use crate::OpsResult;
use atlas_core::NormRect;
use atlas_info::PartMap;
use atlas_io::ImageData;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, trace, warn};

/// What happened to one part.
#[derive(Debug, Clone, PartialEq)]
pub enum PartOutcome {
    /// The part was written.
    Written {
        /// Output file.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// The output already existed.
    Skipped {
        /// Output file.
        path: PathBuf,
    },
    /// The part could not be produced.
    Failed {
        /// Intended output file.
        path: PathBuf,
        /// Error message.
        error: String,
    },
}

impl PartOutcome {
    /// Output path of the part.
    pub fn path(&self) -> &Path {
        match self {
            PartOutcome::Written { path, .. }
            | PartOutcome::Skipped { path }
            | PartOutcome::Failed { path, .. } => path,
        }
    }
}

/// Progress callbacks for [`extract_all`].
pub trait BatchObserver {
    /// Called once before the first part with the number of parts.
    fn started(&mut self, _total: usize) {}

    /// Called after each part.
    fn part_done(&mut self, _name: &str, _outcome: &PartOutcome) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Parts written.
    pub written: usize,
    /// Parts whose output already existed.
    pub skipped: usize,
    /// Parts that failed.
    pub failed: usize,
    /// `(part, error)` for every failure, in order.
    pub failures: Vec<(String, String)>,
}

impl BatchReport {
    /// Parts processed.
    pub fn total(&self) -> usize {
        self.written + self.skipped + self.failed
    }

    /// Returns `true` if no part failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Everything [`extract_all`] needs to process one sheet.
#[derive(Debug, Clone)]
pub struct BatchJob<'a> {
    /// Sheet image file.
    pub sheet_path: PathBuf,
    /// Name of the per-sheet output directory.
    pub sheet_name: String,
    /// Parts to extract.
    pub parts: &'a PartMap,
    /// Root output directory.
    pub output_dir: PathBuf,
    /// Crop, resize and encode settings.
    pub options: SliceOptions,
}

impl<'a> BatchJob<'a> {
    /// Creates a job with default slice options.
    pub fn new(
        sheet_path: impl Into<PathBuf>,
        sheet_name: impl Into<String>,
        parts: &'a PartMap,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sheet_path: sheet_path.into(),
            sheet_name: sheet_name.into(),
            parts,
            output_dir: output_dir.into(),
            options: SliceOptions::default(),
        }
    }

    /// Sets the slice options.
    pub fn with_options(mut self, options: SliceOptions) -> Self {
        self.options = options;
        self
    }

    /// Output file for a part.
    pub fn output_path(&self, part: &str) -> PathBuf {
        self.output_dir
            .join(&self.sheet_name)
            .join(format!("{}.png", part))
    }
}

/// Sheet decode state, shared across parts.
enum SheetState {
    Pending,
    Loaded(ImageData),
    Failed(String),
}

impl SheetState {
    fn get(&mut self, path: &Path) -> Result<&ImageData, String> {
        if let SheetState::Pending = self {
            *self = match slice::load_sheet(path) {
                Ok(image) => SheetState::Loaded(image),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load sheet");
                    SheetState::Failed(e.to_string())
                }
            };
        }
        match self {
            SheetState::Loaded(image) => Ok(image),
            SheetState::Failed(e) => Err(e.clone()),
            SheetState::Pending => Err("sheet not loaded".into()),
        }
    }
}

/// Extracts every part of a sheet.
///
/// Never fails as a whole: per-part errors are logged, reported to the
/// observer and counted in the returned [`BatchReport`].
pub fn extract_all(job: &BatchJob<'_>, observer: &mut dyn BatchObserver) -> BatchReport {
    trace!(
        sheet = %job.sheet_path.display(),
        parts = job.parts.len(),
        output = %job.output_dir.display(),
        "batch::extract_all"
    );

    let mut report = BatchReport::default();
    let mut sheet = SheetState::Pending;
    observer.started(job.parts.len());

    for (name, record) in job.parts.iter() {
        let path = job.output_path(name);

        let outcome = if path.exists() {
            trace!(part = name, "Output exists, skipping");
            PartOutcome::Skipped { path }
        } else {
            let result = record
                .map_err(|reason| format!("invalid record: {}", reason))
                .and_then(|rect| {
                    let image = sheet.get(&job.sheet_path)?;
                    write_part(image, &rect, &path, &job.options).map_err(|e| e.to_string())
                });
            match result {
                Ok(bytes) => PartOutcome::Written { path, bytes },
                Err(error) => {
                    warn!(part = name, error = %error, "Part failed");
                    PartOutcome::Failed { path, error }
                }
            }
        };

        match &outcome {
            PartOutcome::Written { .. } => report.written += 1,
            PartOutcome::Skipped { .. } => report.skipped += 1,
            PartOutcome::Failed { error, .. } => {
                report.failed += 1;
                report.failures.push((name.to_string(), error.clone()));
            }
        }
        observer.part_done(name, &outcome);
    }

    info!(
        sheet = %job.sheet_name,
        written = report.written,
        skipped = report.skipped,
        failed = report.failed,
        "Batch complete"
    );
    report
}

fn write_part(
    sheet: &ImageData,
    rect: &NormRect,
    path: &Path,
    options: &SliceOptions,
) -> OpsResult<u64> {
    let part = slice::slice(sheet, rect, options)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(atlas_io::IoError::from)?;
    }
    slice::encode(&part, path, options.compression)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let parts = PartMap::new();
        let job = BatchJob::new("art/Sheet.blp", "Sheet", &parts, "out");
        assert_eq!(
            job.output_path("Part-Name"),
            PathBuf::from("out").join("Sheet").join("Part-Name.png")
        );
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport {
            written: 2,
            skipped: 1,
            failed: 0,
            failures: vec![],
        };
        assert_eq!(report.total(), 3);
        assert!(report.is_success());
    }

    #[test]
    fn test_missing_sheet_fails_every_part() {
        let dir = tempfile::tempdir().unwrap();
        let mut parts = PartMap::new();
        parts.insert("a", NormRect::new(0.0, 0.5, 0.0, 0.5));
        parts.insert("b", NormRect::new(0.5, 1.0, 0.5, 1.0));

        let job = BatchJob::new(dir.path().join("missing.blp"), "missing", &parts, dir.path());
        let report = extract_all(&job, &mut NoopObserver);

        assert_eq!(report.failed, 2);
        assert_eq!(report.failures[0].1, report.failures[1].1);
        assert!(!dir.path().join("missing").exists());
    }
}
