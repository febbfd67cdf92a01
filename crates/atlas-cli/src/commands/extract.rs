//! Extract command

use crate::ExtractArgs;
use anyhow::{Context, Result};
use atlas_info::InfoError;
use atlas_ops::slice::slice_image;
use std::path::{Path, PathBuf};
use tracing::{info, trace};

pub fn run(args: ExtractArgs, verbose: u8) -> Result<()> {
    trace!(name = %args.atlas_name, "extract::run");

    let config = args.table.config();
    let table = super::load_table(&config, args.table.download)?;

    let (sheet_id, rect) = table.find_part_by_name(&args.atlas_name).ok_or_else(|| {
        InfoError::NotFound(format!(
            "Atlas name {} not found in the Lua table",
            args.atlas_name
        ))
    })?;
    let rect = rect?;
    println!(
        "Found atlas {} in file {} with coordinates: {}",
        args.atlas_name, sheet_id, rect
    );

    let input = super::sheet_path(&config.art_root, sheet_id);
    let output = output_path(&args, &input);
    if verbose > 0 {
        println!("Reading {}", input.display());
    }

    let options = args.output_args.options();
    let bytes = slice_image(&input, &output, &rect, &options)
        .with_context(|| format!("Failed to extract {} from {}", args.atlas_name, input.display()))?;

    info!(part = %args.atlas_name, output = %output.display(), bytes, "Extracted");
    println!(
        "Asset {} extracted to {} ({})",
        args.atlas_name,
        output.display(),
        super::format_size(bytes)
    );
    Ok(())
}

fn output_path(args: &ExtractArgs, input: &Path) -> PathBuf {
    let file_name = format!("{}.png", args.atlas_name);
    if args.same_dir {
        input.parent().unwrap_or(Path::new(".")).join(file_name)
    } else {
        args.output.clone().unwrap_or_else(|| PathBuf::from(file_name))
    }
}
