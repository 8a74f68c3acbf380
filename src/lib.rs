//! hwpdoc: text and table extraction for HWP / HWPX documents
//!
//! This library reads legacy HWP documents through an external structural
//! decoder, reads modern HWPX archives directly, and rewrites HWPX table cell
//! text while leaving every other byte of the archive untouched.

pub mod config;
pub mod document;
pub mod error;
pub mod session;

/// Export format options
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// Ordered list of table grids
    Json,
    /// One `table_{n}.csv` per grid
    Csv,
    /// Rows as tab-separated lines
    Text,
}

// Re-export commonly used types
pub use config::Config;
pub use document::hwp::{DocumentRecordStream, Record, StructuralDecoder};
pub use document::hwpx::{EditOutcome, EditReport, HwpxDocument, TierPreference, apply_edits};
pub use document::{CellSpan, FileKind, TableGrid};
pub use error::{Error, ReasonCode, Result};
pub use session::{MemorySessionStore, SessionData, SessionStore, Sessions};
