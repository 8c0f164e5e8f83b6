//! Error types for the data-loader crate.
//!
//! Every failure while reading the raw library tables ends up here. The
//! pipeline crate reuses [`DataLoadError`] for malformed records it finds
//! while normalizing, so a whole build run has a single error type.

use thiserror::Error;

/// Errors that can occur during table loading and record normalization
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a row (wrong column count, bad quoting, ...)
    #[error("CSV error in {file}: {source}")]
    CsvError {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A required column was empty for this record
    #[error("Missing required field {field} at line {line}")]
    MissingField { field: String, line: usize },

    /// Interaction date matched none of the accepted layouts
    #[error("Unparseable interaction date {value:?} at line {line}")]
    InvalidDate { value: String, line: usize },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
