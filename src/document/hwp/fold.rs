//! Table fold over a legacy record stream
//!
//! Table records arrive flat: a `TableBegin`, a `TableBody` with the declared
//! shape, then `TableCell` markers each followed by the text chunks of that
//! cell. [`TableFold`] turns them into grids in one left-to-right pass.
//! There is no end-of-table record; a table stays open until the next
//! `TableBegin` or the end of its section.

use super::records::Record;
use crate::document::models::{MAX_GRID_DIMENSION, TableGrid};

/// Declared shapes larger than this are sized by the cells actually present
const MAX_DECLARED_CELLS: usize = 1 << 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldState {
    Idle,
    TableOpen,
    CellOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingCell {
    row: usize,
    col: usize,
    text: String,
}

/// What feeding one record did
#[derive(Debug, Default, PartialEq)]
pub struct FoldStep {
    /// The record belongs to a table and is not body content
    pub absorbed: bool,
    /// A table closed by this record
    pub finished: Option<TableGrid>,
}

#[derive(Debug)]
pub struct TableFold {
    section_index: usize,
    state: FoldState,
    pending_dims: Option<(usize, usize)>,
    pending_cells: Vec<PendingCell>,
}

impl TableFold {
    pub fn new(section_index: usize) -> Self {
        Self {
            section_index,
            state: FoldState::Idle,
            pending_dims: None,
            pending_cells: Vec::new(),
        }
    }

    pub fn state(&self) -> FoldState {
        self.state
    }

    pub fn feed(&mut self, record: &Record) -> FoldStep {
        match record {
            Record::TableBegin => {
                let finished = self.finalize();
                self.state = FoldState::TableOpen;
                FoldStep {
                    absorbed: true,
                    finished,
                }
            }
            Record::TableBody { rows, cols } if self.state != FoldState::Idle => {
                self.pending_dims = Some((*rows, *cols));
                absorbed()
            }
            Record::TableCell { row, col } if self.state != FoldState::Idle => {
                self.pending_cells.push(PendingCell {
                    row: *row,
                    col: *col,
                    text: String::new(),
                });
                self.state = FoldState::CellOpen;
                absorbed()
            }
            Record::TextChunk { text } if self.state == FoldState::CellOpen => {
                if let Some(cell) = self.pending_cells.last_mut() {
                    cell.text.push_str(text);
                }
                absorbed()
            }
            _ => FoldStep::default(),
        }
    }

    /// Close whatever table is still open at the end of the section
    pub fn finish(&mut self) -> Option<TableGrid> {
        self.finalize()
    }

    fn finalize(&mut self) -> Option<TableGrid> {
        let dims = self.pending_dims.take();
        let cells = std::mem::take(&mut self.pending_cells);
        self.state = FoldState::Idle;

        let (rows, cols) = dims?;
        if cells.is_empty() {
            return None;
        }
        if rows == 0 || cols == 0 {
            log::debug!("discarding {rows}x{cols} table in section {}", self.section_index);
            return None;
        }

        let (rows, cols) = bounded_shape(rows, cols, &cells);
        if rows == 0 || cols == 0 {
            return None;
        }
        if rows.saturating_mul(cols) > MAX_DECLARED_CELLS {
            log::warn!(
                "discarding oversized {rows}x{cols} table in section {}",
                self.section_index
            );
            return None;
        }

        let mut grid = vec![vec![String::new(); cols]; rows];
        for cell in cells {
            match grid.get_mut(cell.row).and_then(|r| r.get_mut(cell.col)) {
                Some(slot) => *slot = cell.text,
                None => log::debug!(
                    "dropping cell ({}, {}) outside {rows}x{cols} table",
                    cell.row,
                    cell.col
                ),
            }
        }

        let mut table = TableGrid::from_rows(grid);
        table.section_index = Some(self.section_index);
        Some(table)
    }
}

/// Declared shape clamped to what a grid can hold. A shape whose cell count
/// is implausible shrinks to the extent of the cells that fall inside it.
fn bounded_shape(rows: usize, cols: usize, cells: &[PendingCell]) -> (usize, usize) {
    let rows = rows.min(MAX_GRID_DIMENSION);
    let cols = cols.min(MAX_GRID_DIMENSION);
    if rows.saturating_mul(cols) <= MAX_DECLARED_CELLS {
        return (rows, cols);
    }

    let inside = cells.iter().filter(|c| c.row < rows && c.col < cols);
    let used_rows = inside.clone().map(|c| c.row + 1).max().unwrap_or(0);
    let used_cols = inside.map(|c| c.col + 1).max().unwrap_or(0);
    log::debug!("declared {rows}x{cols} table shrunk to {used_rows}x{used_cols}");
    (used_rows, used_cols)
}

fn absorbed() -> FoldStep {
    FoldStep {
        absorbed: true,
        finished: None,
    }
}

/// All tables of one section's records, in order
pub fn fold_tables(section_index: usize, records: &[Record]) -> Vec<TableGrid> {
    let mut fold = TableFold::new(section_index);
    let mut tables: Vec<TableGrid> = records
        .iter()
        .filter_map(|record| fold.feed(record).finished)
        .collect();
    tables.extend(fold.finish());
    tables
}
