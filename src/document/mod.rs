//! Document parsing and data structures module
//!
//! Readers for the legacy record-stream format ([`hwp`]) and the modern
//! ZIP + XML format ([`hwpx`]), the byte-faithful table editor, and the
//! [`TableGrid`] model both sides share.

pub mod hwp;
pub mod hwpx;
pub mod io;
pub mod loader;
pub mod models;
pub(crate) mod parsing;
pub mod tables;

pub use io::{
    detect_file_kind, export_csv_dir, is_hwpx_bytes, is_hwpx_file, load_tables_json,
    save_tables_json, tables_from_json, tables_to_json, write_csv,
};
pub use loader::{LoadedDocument, load_document};
pub use models::*;
pub use parsing::numbering::NumberingFormat;
pub use tables::{CellEdit, apply_cell_edits, set_cell};
