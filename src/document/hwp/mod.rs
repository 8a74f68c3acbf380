//! Legacy-format (HWP) reader
//!
//! Works on the [`DocumentRecordStream`] produced by a [`StructuralDecoder`]
//! and never touches the compound-document container itself. Text, tables
//! and the rich document model are independent folds over the same stream.

pub mod decoder;
pub mod fold;
pub mod records;
pub mod strategies;

use serde::Serialize;
use std::path::Path;

use super::models::*;
use super::parsing::formatting::{char_style_formatting, paragraph_format};
use super::parsing::numbering::DocumentNumberingManager;
use crate::error::ReasonCode;
pub use decoder::{CommandDecoder, StructuralDecoder, UnconfiguredDecoder, decoder_for_command};
pub use fold::{TableFold, fold_tables};
pub use records::{CharStyle, DocumentRecordStream, NumberingRef, ParagraphStyle, Record};

/// Flat text: every text chunk in order, one newline after each paragraph
/// that produced text
pub fn extract_text(stream: &DocumentRecordStream) -> String {
    let mut text = String::new();

    for records in &stream.sections {
        let mut paragraph_has_text = false;
        for record in records {
            match record {
                Record::ParagraphStart if paragraph_has_text => {
                    text.push('\n');
                    paragraph_has_text = false;
                }
                Record::TextChunk { text: chunk } => {
                    text.push_str(chunk);
                    paragraph_has_text = true;
                }
                _ => {}
            }
        }
        if paragraph_has_text {
            text.push('\n');
        }
    }

    text
}

/// Every table of every section, in section then reading order
pub fn extract_tables(stream: &DocumentRecordStream) -> Vec<TableGrid> {
    stream
        .sections
        .iter()
        .enumerate()
        .flat_map(|(section_index, records)| fold_tables(section_index, records))
        .collect()
}

#[derive(Default)]
struct ParagraphBuilder {
    runs: Vec<FormattedRun>,
    format: ParagraphFormat,
    numbering: Option<NumberingRef>,
    formatting: TextFormatting,
    styled: bool,
}

impl ParagraphBuilder {
    fn apply_char_style(&mut self, style: &CharStyle) {
        self.formatting = char_style_formatting(style);
        // a style that trails its text applies to the runs already seen
        if !self.styled {
            for run in &mut self.runs {
                run.formatting = self.formatting.clone();
            }
            self.styled = true;
        }
    }

    fn push_text(&mut self, text: &str) {
        self.runs.push(FormattedRun {
            text: text.to_string(),
            formatting: self.formatting.clone(),
        });
    }

    fn build(self, numbering: &mut DocumentNumberingManager) -> Option<DocumentElement> {
        if self.runs.is_empty() {
            return None;
        }
        let mut format = self.format;
        if let Some(n) = self.numbering {
            format.list_marker = Some(numbering.generate_number(n.id, n.level, n.format));
        }
        Some(DocumentElement::Paragraph {
            runs: FormattedRun::consolidate_runs(self.runs),
            format,
        })
    }
}

/// Rich document model: paragraphs with runs and list markers, tables at the
/// position of their `TableBegin`, and images after the paragraph that
/// anchors them.
pub fn build_document(stream: &DocumentRecordStream) -> HwpDocument {
    // Tables reserve a slot when they open and fill it once the fold closes them
    let mut slots: Vec<Option<DocumentElement>> = Vec::new();
    let mut numbering = DocumentNumberingManager::new();

    for (section_index, records) in stream.sections.iter().enumerate() {
        let mut fold = TableFold::new(section_index);
        let mut paragraph = ParagraphBuilder::default();
        let mut images = Vec::new();
        let mut table_slot = None;

        for record in records {
            let step = fold.feed(record);
            if let Some(table) = step.finished {
                fill_slot(&mut slots, table_slot.take(), table);
            }

            if let Record::TableBegin = record {
                flush(&mut slots, &mut paragraph, &mut images, &mut numbering);
                table_slot = Some(slots.len());
                slots.push(None);
                continue;
            }
            if step.absorbed {
                continue;
            }

            match record {
                Record::ParagraphStart => {
                    flush(&mut slots, &mut paragraph, &mut images, &mut numbering);
                }
                Record::ParagraphStyle(style) => {
                    paragraph.format = paragraph_format(style);
                    paragraph.numbering = style.numbering;
                }
                Record::CharStyle(style) => paragraph.apply_char_style(style),
                Record::TextChunk { text } => paragraph.push_text(text),
                Record::Image {
                    width,
                    height,
                    binary_ref,
                } => images.push(DocumentElement::Image {
                    width: *width,
                    height: *height,
                    binary_ref: binary_ref.clone(),
                }),
                Record::TableBegin | Record::TableBody { .. } | Record::TableCell { .. } => {}
            }
        }

        if let Some(table) = fold.finish() {
            fill_slot(&mut slots, table_slot.take(), table);
        }
        flush(&mut slots, &mut paragraph, &mut images, &mut numbering);
    }

    HwpDocument {
        elements: slots.into_iter().flatten().collect(),
        section_count: stream.section_count(),
    }
}

fn flush(
    slots: &mut Vec<Option<DocumentElement>>,
    paragraph: &mut ParagraphBuilder,
    images: &mut Vec<DocumentElement>,
    numbering: &mut DocumentNumberingManager,
) {
    let finished = std::mem::take(paragraph);
    slots.push(finished.build(numbering));
    slots.extend(images.drain(..).map(Some));
}

fn fill_slot(slots: &mut [Option<DocumentElement>], slot: Option<usize>, table: TableGrid) {
    if let Some(entry) = slot.and_then(|index| slots.get_mut(index)) {
        *entry = Some(DocumentElement::Table { table });
    }
}

/// Outcome of reading a legacy file through a decoder.
///
/// When decoding fails `text` is `None`, `tables` is empty and `reason`
/// says why; a partial grid is never returned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LegacyExtraction {
    pub text: Option<String>,
    pub tables: Vec<TableGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn read_hwp(decoder: &dyn StructuralDecoder, path: &Path) -> LegacyExtraction {
    match decoder.decode(path) {
        Ok(stream) => LegacyExtraction {
            text: Some(extract_text(&stream)),
            tables: extract_tables(&stream),
            reason: None,
            detail: None,
        },
        Err(err) => {
            log::warn!("cannot decode {}: {err}", path.display());
            LegacyExtraction {
                reason: Some(err.reason()),
                detail: Some(err.to_string()),
                ..Default::default()
            }
        }
    }
}
