//! Where atlas tables come from.
//!
//! A table lives in a local file. If the file is missing, or a refresh is
//! forced, it is downloaded first. Downloads go through the [`Fetch`] trait
//! so tests can serve bytes without a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use atlas_info::source::{load_table, HttpFetcher, SourceOptions};
//!
//! let options = SourceOptions::new(url, ".cache/AtlasInfo.lua");
//! let table = load_table(&options, &HttpFetcher::new())?;
//! ```

use crate::{AtlasTable, InfoError, InfoResult};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Default location of the published atlas table.
pub const DEFAULT_INFO_URL: &str =
    "https://www.townlong-yak.com/framexml/live/Helix/AtlasInfo.lua/get";

/// Downloads a resource by URL.
pub trait Fetch {
    /// Returns the full response body.
    fn fetch(&self, url: &str) -> InfoResult<Vec<u8>>;
}

/// Blocking HTTP fetcher.
///
/// One request per call, no retries, no timeouts.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Creates a fetcher with its own connection pool.
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("atlas-rs/", env!("CARGO_PKG_VERSION")))
                .build(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> InfoResult<Vec<u8>> {
        trace!(url, "HttpFetcher::fetch");

        let resp = self
            .agent
            .get(url)
            .call()
            .map_err(|e| InfoError::Fetch(format!("{url}: {e}")))?;

        let mut body = Vec::new();
        resp.into_reader()
            .read_to_end(&mut body)
            .map_err(|e| InfoError::Fetch(format!("{url}: reading body: {e}")))?;

        debug!(url, bytes = body.len(), "Fetched");
        Ok(body)
    }
}

/// Where to find the table and when to refresh it.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// URL to download from.
    pub url: String,
    /// Local file the table is cached in.
    pub path: PathBuf,
    /// Download even when `path` already exists.
    pub force_download: bool,
}

impl SourceOptions {
    /// Options that download only when the file is missing.
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            force_download: false,
        }
    }

    /// Sets whether an existing file is replaced by a fresh download.
    pub fn force_download(mut self, force: bool) -> Self {
        self.force_download = force;
        self
    }
}

/// Makes sure the table file exists, then parses it.
pub fn load_table(options: &SourceOptions, fetcher: &dyn Fetch) -> InfoResult<AtlasTable> {
    trace!(path = %options.path.display(), force = options.force_download, "load_table");

    if options.force_download || !options.path.exists() {
        download_to(fetcher, &options.url, &options.path)?;
    } else {
        debug!(path = %options.path.display(), "Using cached atlas table");
    }

    let bytes = fs::read(&options.path)?;
    let text = String::from_utf8_lossy(&bytes);
    AtlasTable::parse(&text)
}

/// Downloads `url` into `dest`.
///
/// The body is written to a sibling `.part` file and renamed into place, so
/// an interrupted download never leaves a truncated table behind. Parent
/// directories are created as needed. Returns the number of bytes written.
pub fn download_to(fetcher: &dyn Fetch, url: &str, dest: &Path) -> InfoResult<u64> {
    info!(url, dest = %dest.display(), "Downloading atlas table");

    let body = fetcher.fetch(url)?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = part_path(dest);
    fs::write(&tmp, &body)?;
    if let Err(e) = fs::rename(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    Ok(body.len() as u64)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("cache/AtlasInfo.lua")),
            PathBuf::from("cache/AtlasInfo.lua.part")
        );
    }

    #[test]
    fn test_builder() {
        let o = SourceOptions::new("http://x", "a.lua").force_download(true);
        assert!(o.force_download);
        assert_eq!(o.path, PathBuf::from("a.lua"));
    }
}
