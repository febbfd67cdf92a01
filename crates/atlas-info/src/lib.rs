//! # atlas-info
//!
//! Atlas coordinate tables: which sheet holds which part, and where.
//!
//! Tables are published as Lua source (`AtlasInfo.lua`). This crate parses
//! that source without a Lua runtime, keeps sheets and parts in source order
//! and answers the lookups the extractor needs:
//!
//! - [`AtlasTable::find_part_by_name`] - part name to sheet + rectangle
//! - [`AtlasTable::find_sheet_by_part_name`] - part name to sheet id
//! - [`AtlasTable::find_part_map_by_sheet_substring`] - sheet path to all its parts
//!
//! [`source`] downloads and caches the table file.
//!
//! # Example
//!
//! ```rust,ignore
//! use atlas_info::source::{load_table, HttpFetcher, SourceOptions};
//!
//! let table = load_table(&SourceOptions::new(url, path), &HttpFetcher::new())?;
//! if let Some((sheet, Ok(rect))) = table.find_part_by_name("QuestBG-Parchment") {
//!     println!("{sheet}: {rect}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod lua;
pub mod source;
pub mod table;

pub use error::{InfoError, InfoResult};
pub use table::{AtlasTable, PartMap, Sheet};

pub use atlas_core::NormRect;
