//! Atlas table error types.

use thiserror::Error;

/// Result type for atlas table operations.
pub type InfoResult<T> = Result<T, InfoError>;

/// Errors that can occur while loading or querying an atlas table.
#[derive(Debug, Error)]
pub enum InfoError {
    /// The table text is not valid table-literal Lua.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        /// 1-based line of the offending token
        line: usize,
        /// 1-based column of the offending token
        column: usize,
        /// What went wrong
        message: String,
    },

    /// The text parsed, but its shape is not sheet -> part -> record.
    #[error("invalid table structure: {0}")]
    InvalidStructure(String),

    /// A part record lacks its four rectangle fields.
    #[error("invalid record {sheet}/{part}: {reason}")]
    InvalidRecord {
        /// Sheet the record belongs to
        sheet: String,
        /// Part name of the record
        part: String,
        /// Why it was rejected
        reason: String,
    },

    /// Downloading the table failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// A lookup found nothing.
    #[error("{0}")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
