//! Deconstruct command

use crate::DeconstructArgs;
use anyhow::{bail, Result};
use atlas_info::{AtlasTable, InfoError, Sheet};
use atlas_ops::batch::{extract_all, BatchJob, BatchObserver, PartOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{info, trace};

pub fn run(args: DeconstructArgs, verbose: u8) -> Result<()> {
    trace!(identifier = %args.identifier, "deconstruct::run");

    let config = args.table.config();
    let table = super::load_table(&config, args.table.download)?;
    let sheet = resolve_sheet(&table, &args.identifier, &config.art_root)?;

    println!("Number of assets to extract: {}", sheet.parts.len());
    println!("Assets to extract:");
    for name in sheet.parts.names() {
        println!(" - {}", name);
    }

    let input = super::sheet_path(&config.art_root, &sheet.id);
    if verbose > 0 {
        println!("Reading {}", input.display());
    }

    let job = BatchJob::new(&input, sheet.base_name(), &sheet.parts, &args.output_dir)
        .with_options(args.output_args.options());
    let mut progress = Progress::new();
    let report = extract_all(&job, &mut progress);
    progress.finish();

    for (part, error) in &report.failures {
        eprintln!("Error: {}: {}", part, error);
    }

    info!(
        written = report.written,
        skipped = report.skipped,
        failed = report.failed,
        "Deconstruct complete"
    );
    println!(
        "Processed: {} written, {} skipped, {} failed",
        report.written, report.skipped, report.failed
    );

    if report.failed > 0 {
        bail!("{} parts failed", report.failed);
    }

    Ok(())
}

/// Finds the sheet named by a file on disk or by one of its parts.
fn resolve_sheet<'t>(table: &'t AtlasTable, identifier: &str, art_root: &Path) -> Result<&'t Sheet> {
    let path = Path::new(identifier);

    if path.is_file() {
        let needle = super::sheet_needle(path, art_root);
        println!("Looking for file: {}", needle);
        return table
            .find_part_map_by_sheet_substring(&needle)
            .ok_or_else(|| {
                InfoError::NotFound(format!("File {} not found in the Lua table", identifier)).into()
            });
    }

    let sheet_id = table.find_sheet_by_part_name(identifier).ok_or_else(|| {
        InfoError::NotFound(format!("Atlas name {} not found in the Lua table", identifier))
    })?;
    println!("Found atlas {} in file {}", identifier, sheet_id);

    table
        .sheet(sheet_id)
        .ok_or_else(|| InfoError::NotFound(format!("File {} not found in the Lua table", sheet_id)).into())
}

/// Progress bar fed by batch callbacks.
struct Progress {
    bar: ProgressBar,
}

impl Progress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("Extracting parts [{bar:30}] {pos}/{len} {msg}")
        {
            bar.set_style(style);
        }
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BatchObserver for Progress {
    fn started(&mut self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn part_done(&mut self, name: &str, outcome: &PartOutcome) {
        let verb = match outcome {
            PartOutcome::Written { .. } => "Processed",
            PartOutcome::Skipped { .. } => "Skipped",
            PartOutcome::Failed { .. } => "Failed",
        };
        self.bar.set_message(format!("{} {}", verb, name));
        self.bar.inc(1);
    }
}
