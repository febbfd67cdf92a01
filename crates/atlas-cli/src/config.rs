//! Runtime configuration.
//!
//! Each setting resolves once at startup: explicit flag, then environment
//! variable, then built-in default. Empty variables count as unset.

use atlas_info::source::{SourceOptions, DEFAULT_INFO_URL};
use std::path::PathBuf;

/// Overrides the table download URL.
pub const ENV_INFO_URL: &str = "ATLAS_INFO_GET_URL";
/// Overrides the art root.
pub const ENV_ART_ROOT: &str = "WOW_ART_FILES_PATH";
/// Overrides the directory holding the cached table.
pub const ENV_CACHE_DIR: &str = "ATLAS_CACHE_DIR";

/// Art root used when neither flag nor environment names one.
pub const DEFAULT_ART_ROOT: &str =
    "/mnt/c/Program Files/World of Warcraft/_retail_/BlizzardInterfaceArt";

/// File name of the cached table.
pub const CACHE_FILE_NAME: &str = "AtlasInfo.lua";

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--url`
    pub info_url: Option<String>,
    /// `--path`
    pub art_root: Option<PathBuf>,
    /// `--info`
    pub info_file: Option<PathBuf>,
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Where the coordinate table is downloaded from.
    pub info_url: String,
    /// Directory the sheet ids are relative to.
    pub art_root: PathBuf,
    /// Local copy of the coordinate table.
    pub cache_file: PathBuf,
}

impl Config {
    /// Resolves against the process environment.
    pub fn resolve(overrides: &Overrides) -> Self {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolves with an explicit environment lookup.
    pub fn resolve_with<F>(overrides: &Overrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());

        let info_url = overrides
            .info_url
            .clone()
            .or_else(|| env(ENV_INFO_URL))
            .unwrap_or_else(|| DEFAULT_INFO_URL.to_string());

        let art_root = overrides
            .art_root
            .clone()
            .or_else(|| env(ENV_ART_ROOT).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ART_ROOT));

        let cache_file = overrides.info_file.clone().unwrap_or_else(|| {
            env(ENV_CACHE_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(default_cache_dir)
                .join(CACHE_FILE_NAME)
        });

        Self {
            info_url,
            art_root,
            cache_file,
        }
    }

    /// Table source settings for this configuration.
    pub fn source_options(&self, force_download: bool) -> SourceOptions {
        SourceOptions::new(self.info_url.clone(), self.cache_file.clone()).force_download(force_download)
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("atlas-rs"))
        .unwrap_or_else(|| PathBuf::from(".cache"))
}
