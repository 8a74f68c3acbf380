//! Core data structures for document representation
//!
//! This module defines the public types shared by both readers and the
//! editor: the [`TableGrid`] interchange shape and the richer paragraph
//! model built from legacy record streams.

use serde::{Deserialize, Serialize};

/// Largest row or column count a grid may take; both formats store table
/// dimensions as 16-bit values
pub const MAX_GRID_DIMENSION: usize = u16::MAX as usize;

/// Row-major cell text, one inner vector per row
pub type GridRows = Vec<Vec<String>>;

/// A 2D table of cell text produced by either reader and consumed by the editor.
///
/// `row_count == rows.len()` and `col_count` is the widest row. Grids coming
/// out of a reader are normalized, so every row is exactly `col_count` long.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGrid {
    #[serde(rename = "section", default, skip_serializing_if = "Option::is_none")]
    pub section_index: Option<usize>,
    pub rows: GridRows,
    #[serde(default)]
    pub row_count: usize,
    #[serde(default)]
    pub col_count: usize,
    #[serde(rename = "cells", default, skip_serializing_if = "Option::is_none")]
    pub cell_spans: Option<Vec<Vec<CellSpan>>>,
}

/// Merge metadata for one modern-format cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSpan {
    pub text: String,
    pub row: usize,
    pub col: usize,
    pub colspan: usize,
    pub rowspan: usize,
}

impl CellSpan {
    pub fn new(text: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            text: text.into(),
            row,
            col,
            colspan: 1,
            rowspan: 1,
        }
    }
}

/// Which reader a document goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Compound-document container, read through the structural decoder
    Hwp,
    /// ZIP + XML container, readable and editable in place
    Hwpx,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextFormatting {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub font_size: Option<f32>,
    pub font_name: Option<String>,
    pub color: Option<String>,
    pub bg_color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormattedRun {
    pub text: String,
    pub formatting: TextFormatting,
}

impl FormattedRun {
    /// Consolidate adjacent runs with identical formatting into single runs
    pub fn consolidate_runs(runs: Vec<FormattedRun>) -> Vec<FormattedRun> {
        let mut consolidated: Vec<FormattedRun> = Vec::with_capacity(runs.len());

        for run in runs {
            match consolidated.last_mut() {
                Some(last) if last.formatting == run.formatting => last.text.push_str(&run.text),
                _ => consolidated.push(run),
            }
        }

        consolidated
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    Justify,
    Left,
    Center,
    Right,
    Distribute,
}

impl TextAlignment {
    /// Parse the alignment names used by decoder output, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "justify" | "both" => Some(Self::Justify),
            "left" => Some(Self::Left),
            "center" | "centre" => Some(Self::Center),
            "right" => Some(Self::Right),
            "distribute" | "divide" => Some(Self::Distribute),
            _ => None,
        }
    }
}

/// Paragraph-level layout carried over from `ParagraphStyle` records
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParagraphFormat {
    pub alignment: TextAlignment,
    pub indent: i32,
    /// Generated bullet or number prefix, e.g. "1. " or "• "
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DocumentElement {
    Paragraph {
        runs: Vec<FormattedRun>,
        format: ParagraphFormat,
    },
    Table {
        table: TableGrid,
    },
    Image {
        width: Option<u32>,
        height: Option<u32>,
        binary_ref: Option<String>,
    },
}

impl DocumentElement {
    /// Plain text of a paragraph element, including its list marker
    pub fn paragraph_text(&self) -> Option<String> {
        match self {
            DocumentElement::Paragraph { runs, format } => {
                let mut text = format.list_marker.clone().unwrap_or_default();
                text.extend(runs.iter().map(|run| run.text.as_str()));
                Some(text)
            }
            _ => None,
        }
    }
}

/// Rich view of a legacy document: paragraphs, tables and images in reading order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HwpDocument {
    pub elements: Vec<DocumentElement>,
    pub section_count: usize,
}

impl HwpDocument {
    pub fn tables(&self) -> impl Iterator<Item = &TableGrid> {
        self.elements.iter().filter_map(|element| match element {
            DocumentElement::Table { table } => Some(table),
            _ => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, DocumentElement::Image { .. }))
            .count()
    }
}
