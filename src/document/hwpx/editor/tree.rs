//! Tree tier: edit cell text on the parsed tag tree
//!
//! Only used for a section whose unedited tree serializes back to the exact
//! input bytes, so everything outside the touched `t` / `run` elements is
//! written out verbatim.

use super::super::locate::locate_tables;
use super::super::xml::{XmlDocument, XmlElement};
use super::TableEdits;
use crate::document::models::TableGrid;

/// Parsed section plus the number of tables the reader would report for it
pub(crate) struct TreeSection {
    doc: XmlDocument,
    pub(crate) table_count: usize,
}

impl TreeSection {
    pub(crate) fn parse(xml: &str) -> Result<Self, super::super::xml::TreeError> {
        let doc = XmlDocument::parse(xml)?;
        let table_count = locate_tables(&doc).len();
        Ok(Self { doc, table_count })
    }

    /// True when serializing the unedited tree reproduces `original` exactly
    pub(crate) fn is_verbatim(&self, original: &[u8]) -> bool {
        match self.doc.to_bytes() {
            Ok(bytes) => bytes == original,
            Err(_) => false,
        }
    }

    /// Apply the targets starting at global table index `base`
    pub(crate) fn apply(
        mut self,
        targets: &[TableGrid],
        base: usize,
    ) -> Result<(Vec<u8>, TableEdits), super::super::xml::TreeError> {
        let mut edits = TableEdits::default();

        for (offset, table) in locate_tables(&self.doc).iter().enumerate() {
            let Some(target) = targets.get(base + offset) else {
                break;
            };
            edits.tables_matched += 1;

            for (row, target_row) in table.rows.iter().zip(&target.rows) {
                for (cell_path, value) in row.cells.iter().zip(target_row) {
                    if let Some(cell) = self.doc.element_at_mut(cell_path) {
                        if write_cell_text(cell, value) {
                            edits.cells_written += 1;
                        }
                    }
                }
            }
        }

        let bytes = self.doc.to_bytes()?;
        Ok((bytes, edits))
    }
}

/// Put `value` into a cell with the smallest structural change.
///
/// 1. the first `t` element gets its content replaced
/// 2. otherwise a new `t` is appended to the first `run` (expanding `<run/>`)
/// 3. otherwise a `run` holding a `t` is appended to the cell
///
/// Returns false when the cell already reads as `value`.
pub(crate) fn write_cell_text(cell: &mut XmlElement, value: &str) -> bool {
    if let Some(path) = cell.find_paths("t").into_iter().next() {
        let Some(text) = cell.descendant_at_mut(&path) else {
            return false;
        };
        if text.direct_text() == value {
            return false;
        }
        text.set_text(value);
        return true;
    }

    // no text element means the cell currently reads as empty
    if value.is_empty() {
        return false;
    }

    if let Some(path) = cell.find_paths("run").into_iter().next() {
        let Some(run) = cell.descendant_at_mut(&path) else {
            return false;
        };
        let mut text = run.sibling_kind("t");
        text.set_text(value);
        run.append(text);
        return true;
    }

    let mut run = cell.sibling_kind("run");
    let mut text = cell.sibling_kind("t");
    text.set_text(value);
    run.append(text);
    cell.append(run);
    true
}
