//! Slice command

use crate::SliceArgs;
use anyhow::{Context, Result};
use atlas_core::NormRect;
use atlas_ops::slice::slice_image;
use tracing::trace;

pub fn run(args: SliceArgs, verbose: u8) -> Result<()> {
    let rect = NormRect::new(args.left, args.right, args.top, args.bottom);
    trace!(input = %args.input.display(), %rect, "slice::run");

    let options = args.output_args.options();
    if verbose > 0 {
        println!(
            "Slicing {} ({}), resize: {}, filter: {}",
            args.input.display(),
            rect,
            options.resize,
            options.filter
        );
    }

    let bytes = slice_image(&args.input, &args.output, &rect, &options)
        .with_context(|| format!("Failed to slice {}", args.input.display()))?;

    println!(
        "Output image saved to {} ({})",
        args.output.display(),
        super::format_size(bytes)
    );
    Ok(())
}
