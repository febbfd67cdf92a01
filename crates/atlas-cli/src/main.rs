//! atlas - extract parts from texture atlas sheets
//!
//! Looks parts up in the `AtlasInfo.lua` coordinate table, crops them out of
//! BLP or PNG sheets and writes PNG (or BLP) files.

use anyhow::Result;
use atlas_info::InfoError;
use atlas_ops::Filter;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "atlas")]
#[command(author, version, about = "Extract parts from texture atlas sheets")]
#[command(long_about = "
Extracts named parts from texture atlas sheets using the normalized
coordinates in AtlasInfo.lua. The table is downloaded and cached on first use.

Examples:
  atlas extract UI-HUD-UnitFrame-Player-Portrait
  atlas extract Garr_Building-Shadow out/shadow.png --resize
  atlas deconstruct Interface/HUD/UIUnitFrame2x.blp --output-dir parts
  atlas deconstruct UI-HUD-UnitFrame-Player-Portrait
  atlas slice sheet.blp part.png 0.25 0.75 0.5 1.0

Environment:
  ATLAS_INFO_GET_URL   table download URL
  WOW_ART_FILES_PATH   directory holding the exported art files
  ATLAS_CACHE_DIR      directory for the cached table
  RUST_LOG             log filter (overrides -v)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a single atlas part by name
    #[command(visible_alias = "x")]
    Extract(ExtractArgs),

    /// Extract every part of one sheet
    #[command(visible_alias = "d")]
    Deconstruct(DeconstructArgs),

    /// Cut a normalized rectangle out of an image file
    #[command(visible_alias = "s")]
    Slice(SliceArgs),
}

/// Where the coordinate table and the art files come from.
#[derive(Args)]
struct TableArgs {
    /// Lua file with the atlas info (downloaded there if missing)
    #[arg(long)]
    info: Option<PathBuf>,

    /// Force a fresh download of the atlas info
    #[arg(long)]
    download: bool,

    /// Directory holding the exported art files
    #[arg(long)]
    path: Option<PathBuf>,

    /// URL the atlas info is downloaded from
    #[arg(long)]
    url: Option<String>,
}

/// How parts are resized and encoded.
#[derive(Args)]
struct OutputArgs {
    /// Resize output to the next power of two per dimension
    #[arg(long)]
    resize: bool,

    /// Resize filter: bilinear, bicubic, lanczos3
    #[arg(short, long, default_value = "bicubic")]
    filter: Filter,

    /// PNG compression level (0-9)
    #[arg(long, default_value = "9", value_parser = clap::value_parser!(u8).range(0..=9))]
    compress_level: u8,
}

#[derive(Args)]
struct ExtractArgs {
    /// Atlas part name
    atlas_name: String,

    /// Output file (default: <atlas_name>.png)
    output: Option<PathBuf>,

    /// Write the output next to the source sheet
    #[arg(long)]
    same_dir: bool,

    #[command(flatten)]
    table: TableArgs,

    #[command(flatten)]
    output_args: OutputArgs,
}

#[derive(Args)]
struct DeconstructArgs {
    /// Sheet file under the art root, or the name of one of its parts
    identifier: String,

    /// Directory the per-sheet folders are created in
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    #[command(flatten)]
    table: TableArgs,

    #[command(flatten)]
    output_args: OutputArgs,
}

#[derive(Args)]
struct SliceArgs {
    /// Input image (BLP or PNG)
    input: PathBuf,

    /// Output image (.png or .blp)
    output: PathBuf,

    /// Normalized left edge
    left: f64,

    /// Normalized right edge
    right: f64,

    /// Normalized top edge
    top: f64,

    /// Normalized bottom edge
    bottom: f64,

    #[command(flatten)]
    output_args: OutputArgs,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract(args) => commands::extract::run(args, cli.verbose),
        Commands::Deconstruct(args) => commands::deconstruct::run(args, cli.verbose),
        Commands::Slice(args) => commands::slice::run(args, cli.verbose),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<InfoError>() {
            Some(InfoError::NotFound(message)) => {
                println!("{}", message);
                ExitCode::from(2)
            }
            _ => {
                eprintln!("Error: {:?}", e);
                ExitCode::FAILURE
            }
        },
    }
}
