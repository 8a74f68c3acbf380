//! HWPX (ZIP + XML) reader
//!
//! Reads every section part in lexical name order, collecting flat text from
//! `t` elements and table grids with per-cell span metadata. A section that
//! fails to parse contributes nothing and is reported; it never aborts the
//! rest of the document.

use serde::Serialize;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use super::locate::{TableLocation, locate_tables};
use super::xml::XmlDocument;
use crate::document::io::{open_archive, read_entry, sorted_section_names};
use crate::document::models::*;
use crate::error::{Error, ReasonCode, Result};

/// Why a section contributed no content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionFailure {
    pub reason: ReasonCode,
    pub message: String,
}

/// One parsed section part
#[derive(Debug, Clone, Default, Serialize)]
pub struct SectionDocument {
    pub source_name: String,
    #[serde(skip)]
    pub raw_text: String,
    pub text: String,
    pub tables: Vec<TableGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SectionFailure>,
}

/// Result of reading a whole HWPX archive
#[derive(Debug, Clone, Default, Serialize)]
pub struct HwpxDocument {
    pub text: String,
    pub tables: Vec<TableGrid>,
    pub sections: Vec<SectionDocument>,
    pub file_list: Vec<String>,
}

impl HwpxDocument {
    pub fn section_failures(&self) -> impl Iterator<Item = (&str, &SectionFailure)> {
        self.sections
            .iter()
            .filter_map(|s| s.failure.as_ref().map(|f| (s.source_name.as_str(), f)))
    }
}

pub fn parse_hwpx_file(file_path: &Path) -> Result<HwpxDocument> {
    let file = std::fs::File::open(file_path)?;
    parse_hwpx_reader(std::io::BufReader::new(file))
}

pub fn parse_hwpx_bytes(bytes: &[u8]) -> Result<HwpxDocument> {
    parse_hwpx_reader(Cursor::new(bytes))
}

/// Parse an archive from any seekable reader.
///
/// Only an unreadable container is an error; an archive without section
/// parts yields an empty document.
pub fn parse_hwpx_reader<R: Read + Seek>(reader: R) -> Result<HwpxDocument> {
    let mut archive = open_archive(reader)?;
    let file_list: Vec<String> = archive.file_names().map(str::to_string).collect();
    let section_names = sorted_section_names(&archive);

    let mut sections = Vec::with_capacity(section_names.len());
    for name in section_names {
        let section = match read_entry(&mut archive, &name) {
            Ok(bytes) => parse_section_bytes(&name, bytes),
            Err(err) => failed_section(&name, String::new(), &err),
        };
        sections.push(section);
    }

    let text = sections
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let tables = sections.iter().flat_map(|s| s.tables.clone()).collect();

    Ok(HwpxDocument {
        text,
        tables,
        sections,
        file_list,
    })
}

fn parse_section_bytes(name: &str, bytes: Vec<u8>) -> SectionDocument {
    let raw_text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let error = Error::SectionParse {
                section: name.to_string(),
                message: err.to_string(),
            };
            return failed_section(name, String::new(), &error);
        }
    };

    match XmlDocument::parse(&raw_text) {
        Ok(doc) => {
            let text = section_text(&doc);
            let tables = extract_tables(&doc);
            log::debug!("{name}: {} chars, {} tables", text.len(), tables.len());
            SectionDocument {
                source_name: name.to_string(),
                raw_text,
                text,
                tables,
                failure: None,
            }
        }
        Err(err) => {
            let error = Error::SectionParse {
                section: name.to_string(),
                message: err.to_string(),
            };
            failed_section(name, raw_text, &error)
        }
    }
}

fn failed_section(name: &str, raw_text: String, error: &Error) -> SectionDocument {
    log::warn!("skipping section {name}: {error}");
    SectionDocument {
        source_name: name.to_string(),
        raw_text,
        failure: Some(SectionFailure {
            reason: ReasonCode::SectionParseError,
            message: error.to_string(),
        }),
        ..Default::default()
    }
}

/// Direct text of every `t` element, concatenated in document order
pub fn section_text(doc: &XmlDocument) -> String {
    doc.elements()
        .into_iter()
        .filter(|element| element.is("t"))
        .map(|element| element.direct_text())
        .collect()
}

/// Table grids for every located table in the section
pub fn extract_tables(doc: &XmlDocument) -> Vec<TableGrid> {
    locate_tables(doc)
        .iter()
        .map(|location| table_grid(doc, location))
        .collect()
}

fn table_grid(doc: &XmlDocument, location: &TableLocation) -> TableGrid {
    let mut rows = Vec::with_capacity(location.rows.len());
    let mut spans = Vec::with_capacity(location.rows.len());

    for (row_idx, row) in location.rows.iter().enumerate() {
        let mut row_text = Vec::with_capacity(row.cells.len());
        let mut row_spans = Vec::with_capacity(row.cells.len());

        for (col_idx, cell_path) in row.cells.iter().enumerate() {
            let Some(cell) = doc.element_at(cell_path) else {
                continue;
            };
            let text = cell.descendant_text("t");

            let mut span = CellSpan::new(text.clone(), row_idx, col_idx);
            if let Some(cell_span) = cell.first_descendant("cellSpan") {
                span.colspan = span_attribute(cell_span.attribute("colSpan"));
                span.rowspan = span_attribute(cell_span.attribute("rowSpan"));
            }

            row_text.push(text);
            row_spans.push(span);
        }

        rows.push(row_text);
        spans.push(row_spans);
    }

    let mut grid = TableGrid::from_rows(rows);
    grid.cell_spans = Some(spans);
    grid
}

fn span_attribute(value: Option<String>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(1)
}
