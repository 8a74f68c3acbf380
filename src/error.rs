//! Error types and machine-readable reason codes
//!
//! Container-level failures abort an operation. Everything below that level
//! (one section, one table, one directed edit) is reported through a
//! [`ReasonCode`] next to whatever partial result could still be produced.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The external structural decoder for legacy documents is missing
    #[error("structural decoder unavailable: {0}")]
    DecoderUnavailable(String),

    /// The legacy container is corrupt or unsupported
    #[error("decode error: {0}")]
    Decode(String),

    /// The input is not a readable modern-format archive
    #[error("cannot open archive: {0}")]
    ArchiveOpen(#[source] zip::result::ZipError),

    #[error("section {section} failed to parse: {message}")]
    SectionParse { section: String, message: String },

    #[error("table index {index} out of range ({len} tables)")]
    TableIndexOutOfRange { index: usize, len: usize },

    #[error("row {row} out of range for table {table} ({rows} rows)")]
    RowIndexOutOfRange {
        table: usize,
        row: usize,
        rows: usize,
    },

    #[error("column {col} out of range for table {table} (at most {limit} columns)")]
    ColumnIndexOutOfRange {
        table: usize,
        col: usize,
        limit: usize,
    },

    #[error("session {0} not found")]
    SessionNotFound(String),

    /// The operation does not apply to this kind of document
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reason codes attached to degraded or failed units of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    DecoderUnavailable,
    DecodeError,
    ArchiveOpenError,
    SectionParseError,
    IndexOutOfRange,
    SessionNotFound,
    Unsupported,
    IoError,
    ConfigError,
}

impl Error {
    pub fn reason(&self) -> ReasonCode {
        match self {
            Error::DecoderUnavailable(_) => ReasonCode::DecoderUnavailable,
            Error::Decode(_) | Error::Json(_) => ReasonCode::DecodeError,
            Error::ArchiveOpen(_) => ReasonCode::ArchiveOpenError,
            Error::SectionParse { .. } => ReasonCode::SectionParseError,
            Error::TableIndexOutOfRange { .. }
            | Error::RowIndexOutOfRange { .. }
            | Error::ColumnIndexOutOfRange { .. } => ReasonCode::IndexOutOfRange,
            Error::SessionNotFound(_) => ReasonCode::SessionNotFound,
            Error::Unsupported(_) => ReasonCode::Unsupported,
            Error::Io(_) | Error::Zip(_) | Error::Csv(_) => ReasonCode::IoError,
            Error::Config(_) => ReasonCode::ConfigError,
        }
    }

    /// True for failures that abort a whole operation rather than one unit of it
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ArchiveOpen(_) | Error::Io(_) | Error::SessionNotFound(_)
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
