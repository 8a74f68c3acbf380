//! Table, row and cell discovery in a section tree
//!
//! Shared by the reader and the editor so both agree on which table is the
//! Nth one. Tables are `tbl` elements in document order (nested tables
//! included), rows are descendant `tr` elements of a table that hold at
//! least one descendant `tc`. Tables without such rows are not counted.

use super::xml::{XmlDocument, XmlElement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLocation {
    pub path: Vec<usize>,
    pub cells: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation {
    pub path: Vec<usize>,
    pub rows: Vec<RowLocation>,
}

/// Absolute paths of every non-empty table in `doc`
pub fn locate_tables(doc: &XmlDocument) -> Vec<TableLocation> {
    doc.find_paths("tbl")
        .into_iter()
        .filter_map(|table_path| {
            let table = doc.element_at(&table_path)?;
            let rows = locate_rows(table, &table_path);
            if rows.is_empty() {
                None
            } else {
                Some(TableLocation {
                    path: table_path,
                    rows,
                })
            }
        })
        .collect()
}

fn locate_rows(table: &XmlElement, table_path: &[usize]) -> Vec<RowLocation> {
    table
        .find_paths("tr")
        .into_iter()
        .filter_map(|relative| {
            let row = table.descendant_at(&relative)?;
            let row_path = join(table_path, &relative);
            let cells: Vec<Vec<usize>> = row
                .find_paths("tc")
                .into_iter()
                .map(|cell| join(&row_path, &cell))
                .collect();
            if cells.is_empty() {
                return None;
            }
            Some(RowLocation {
                path: row_path,
                cells,
            })
        })
        .collect()
}

fn join(base: &[usize], relative: &[usize]) -> Vec<usize> {
    let mut path = Vec::with_capacity(base.len() + relative.len());
    path.extend_from_slice(base);
    path.extend_from_slice(relative);
    path
}
