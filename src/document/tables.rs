//! Table grid operations
//!
//! Construction, normalization and directed cell edits on [`TableGrid`].
//! In-memory edits grow a row when a column lies past its end, up to
//! [`MAX_GRID_DIMENSION`] columns.

use serde::{Deserialize, Serialize};

use super::models::*;
use crate::error::{Error, Result};

impl TableGrid {
    /// Build a grid from raw rows, padding every row to the widest one
    pub fn from_rows(rows: GridRows) -> Self {
        let mut grid = TableGrid {
            rows,
            ..Default::default()
        };
        grid.normalize();
        grid
    }

    /// Recompute `row_count` / `col_count` from `rows` without padding
    pub fn recount(&mut self) {
        self.row_count = self.rows.len();
        self.col_count = self.rows.iter().map(Vec::len).max().unwrap_or(0);
    }

    /// Recount and pad every row with empty strings to `col_count`
    pub fn normalize(&mut self) {
        self.recount();
        let width = self.col_count;
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text, or an empty string when the position lies outside the grid
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Assign one cell.
    ///
    /// Fails when `row` is past the declared row count or `col` is not below
    /// [`MAX_GRID_DIMENSION`]. A column past the end of the row extends it
    /// with empty cells, and the grid is then re-normalized so `col_count`
    /// tracks the widest row.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> Result<()> {
        if row >= self.rows.len() {
            return Err(Error::RowIndexOutOfRange {
                table: 0,
                row,
                rows: self.rows.len(),
            });
        }

        let width = col
            .checked_add(1)
            .filter(|width| *width <= MAX_GRID_DIMENSION)
            .ok_or(Error::ColumnIndexOutOfRange {
                table: 0,
                col,
                limit: MAX_GRID_DIMENSION,
            })?;

        let target = &mut self.rows[row];
        if target.len() < width {
            target.resize(width, String::new());
        }
        target[col] = value.into();

        if let Some(spans) = self.cell_spans.as_mut() {
            if let Some(span) = spans
                .get_mut(row)
                .and_then(|r| r.iter_mut().find(|s| s.col == col))
            {
                span.text = target[col].clone();
            }
        }

        self.normalize();
        Ok(())
    }
}

/// Assign one cell of one grid inside a list of grids
pub fn set_cell(
    tables: &mut [TableGrid],
    table_index: usize,
    row: usize,
    col: usize,
    value: impl Into<String>,
) -> Result<()> {
    let len = tables.len();
    let table = tables
        .get_mut(table_index)
        .ok_or(Error::TableIndexOutOfRange {
            index: table_index,
            len,
        })?;

    table.set_cell(row, col, value).map_err(|err| match err {
        Error::RowIndexOutOfRange { row, rows, .. } => Error::RowIndexOutOfRange {
            table: table_index,
            row,
            rows,
        },
        Error::ColumnIndexOutOfRange { col, limit, .. } => Error::ColumnIndexOutOfRange {
            table: table_index,
            col,
            limit,
        },
        other => other,
    })
}

/// One directed edit in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEdit {
    pub table: usize,
    pub row: usize,
    pub col: usize,
    pub value: String,
}

/// Apply a batch of edits; a failing edit is reported and the rest still apply.
///
/// Returns the position in `edits` and the error for every rejected edit.
pub fn apply_cell_edits(tables: &mut [TableGrid], edits: &[CellEdit]) -> Vec<(usize, Error)> {
    edits
        .iter()
        .enumerate()
        .filter_map(|(position, edit)| {
            set_cell(tables, edit.table, edit.row, edit.col, edit.value.clone())
                .err()
                .map(|err| {
                    log::debug!("edit #{position} rejected: {err}");
                    (position, err)
                })
        })
        .collect()
}
