//! Typed structural records of a legacy document
//!
//! Records arrive from the structural decoder in reading order, one sequence
//! per section, and are consumed left to right without lookahead.

use serde::{Deserialize, Serialize};

use crate::document::models::TextAlignment;
use crate::document::parsing::numbering::NumberingFormat;

/// Reference to a numbering definition carried by a paragraph style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingRef {
    pub id: u32,
    #[serde(default)]
    pub level: u8,
    #[serde(default)]
    pub format: NumberingFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphStyle {
    pub alignment: TextAlignment,
    pub indent: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbering: Option<NumberingRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    #[serde(alias = "strikethrough")]
    pub strikeout: bool,
    #[serde(alias = "size")]
    pub font_size: Option<f32>,
    #[serde(alias = "face_name")]
    pub font_name: Option<String>,
    #[serde(alias = "text_color")]
    pub color: Option<String>,
    #[serde(alias = "shade_color")]
    pub bg_color: Option<String>,
}

/// One record of a legacy record stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Record {
    ParagraphStart,
    ParagraphStyle(ParagraphStyle),
    CharStyle(CharStyle),
    TextChunk {
        text: String,
    },
    /// Opens a table and closes any table still in progress
    TableBegin,
    TableBody {
        rows: usize,
        cols: usize,
    },
    TableCell {
        row: usize,
        col: usize,
    },
    Image {
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        binary_ref: Option<String>,
    },
}

impl Record {
    pub fn text(text: impl Into<String>) -> Self {
        Record::TextChunk { text: text.into() }
    }
}

/// Decoded records, one inner sequence per document section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecordStream {
    pub sections: Vec<Vec<Record>>,
}

impl DocumentRecordStream {
    /// A single-section stream
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            sections: vec![records],
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(Vec::is_empty)
    }

    /// Mutable record list for `index`, creating empty sections up to it
    pub(crate) fn section_mut(&mut self, index: usize) -> &mut Vec<Record> {
        if self.sections.len() <= index {
            self.sections.resize_with(index + 1, Vec::new);
        }
        &mut self.sections[index]
    }
}
