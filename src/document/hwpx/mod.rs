//! Modern-format (HWPX) reading and table editing
//!
//! An HWPX file is a ZIP archive whose body text lives in
//! `Contents/section*.xml` parts. The reader and the editor share
//! [`locate::locate_tables`] so a table's global index means the same thing
//! on both sides.

pub mod editor;
pub mod locate;
pub mod reader;
pub mod xml;

pub use editor::{
    AppliedTier, EditOutcome, EditReport, SectionEditReport, TableEdits, TierPreference,
    apply_edits, apply_edits_to_file, apply_edits_with,
};
pub use reader::{
    HwpxDocument, SectionDocument, SectionFailure, parse_hwpx_bytes, parse_hwpx_file,
    parse_hwpx_reader,
};
