//! CLI command implementations

pub mod deconstruct;
pub mod extract;
pub mod slice;

use crate::config::{Config, Overrides};
use crate::{OutputArgs, TableArgs};
use anyhow::{Context, Result};
use atlas_info::source::{self, HttpFetcher};
use atlas_info::AtlasTable;
use atlas_ops::SliceOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

impl TableArgs {
    /// Resolves the configuration, flags first.
    pub fn config(&self) -> Config {
        Config::resolve(&Overrides {
            info_url: self.url.clone(),
            art_root: self.path.clone(),
            info_file: self.info.clone(),
        })
    }
}

impl OutputArgs {
    /// Slice options for these flags.
    pub fn options(&self) -> SliceOptions {
        SliceOptions::default()
            .with_resize(self.resize)
            .with_filter(self.filter)
            .with_compression(self.compress_level)
    }
}

/// Loads the coordinate table, downloading it when needed.
pub fn load_table(config: &Config, force_download: bool) -> Result<AtlasTable> {
    let options = config.source_options(force_download);
    let table = source::load_table(&options, &HttpFetcher::new()).with_context(|| {
        format!(
            "Failed to load atlas info: {} (from {})",
            options.path.display(),
            options.url
        )
    })?;
    debug!(sheets = table.len(), "Atlas info loaded");
    Ok(table)
}

/// Sheet file for a sheet id: `<art_root>/<id>`, `.blp` appended if missing.
pub fn sheet_path(art_root: &Path, sheet_id: &str) -> PathBuf {
    let has_blp = Path::new(sheet_id)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("blp"));
    if has_blp {
        art_root.join(sheet_id)
    } else {
        art_root.join(format!("{}.blp", sheet_id))
    }
}

/// Substring used to find a sheet file in the table.
///
/// The file is made relative to the art root when it lives under it, the
/// extension is dropped and separators become `/`.
pub fn sheet_needle(file: &Path, art_root: &Path) -> String {
    let relative = file
        .strip_prefix(art_root)
        .map(Path::to_path_buf)
        .ok()
        .or_else(|| {
            let file = file.canonicalize().ok()?;
            let root = art_root.canonicalize().ok()?;
            file.strip_prefix(root).ok().map(Path::to_path_buf)
        })
        .unwrap_or_else(|| file.to_path_buf());

    relative
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_path_appends_blp() {
        let root = Path::new("/art");
        assert_eq!(
            sheet_path(root, "Interface/HUD/Sheet"),
            PathBuf::from("/art/Interface/HUD/Sheet.blp")
        );
        assert_eq!(
            sheet_path(root, "Interface/HUD/Sheet.BLP"),
            PathBuf::from("/art/Interface/HUD/Sheet.BLP")
        );
    }

    #[test]
    fn test_sheet_needle() {
        let root = Path::new("/art");
        assert_eq!(
            sheet_needle(Path::new("/art/Interface/HUD/Sheet.blp"), root),
            "Interface/HUD/Sheet"
        );
        assert_eq!(
            sheet_needle(Path::new("elsewhere/Sheet.png"), root),
            "elsewhere/Sheet"
        );
    }

    #[test]
    fn test_sheet_needle_normalizes_separators() {
        assert_eq!(
            sheet_needle(Path::new(r"Interface\HUD\Sheet.blp"), Path::new("/art")),
            "Interface/HUD/Sheet"
        );
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
