//! Byte-faithful table editing for HWPX archives
//!
//! `apply_edits` rewrites cell text in every section part and leaves all
//! other bytes alone. Each section goes through one of two tiers:
//!
//! - the tree tier, used when the parsed tag tree of the section serializes
//!   back to its exact input bytes
//! - the splice tier, which rewrites the raw text in place, used when the tree
//!   tier is unavailable for that section or disabled by configuration
//!
//! If neither tier can handle a section it is copied through unchanged. Only
//! an unreadable input archive fails the whole call.

mod splice;
mod tree;

use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::document::io::{is_section_part, open_archive, read_entry, sorted_section_names};
use crate::document::models::TableGrid;
use crate::error::{Error, ReasonCode, Result};
use splice::splice_section;
use tree::TreeSection;

/// Which tiers the editor may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierPreference {
    /// Tree tier when the section round-trips verbatim, splice tier otherwise
    #[default]
    Auto,
    /// Splice tier only
    Splice,
}

/// How a section was written to the output archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliedTier {
    Tree,
    Splice,
    Untouched,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableEdits {
    pub tables_matched: usize,
    pub cells_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionEditReport {
    pub section: String,
    pub tier: AppliedTier,
    pub tables_found: usize,
    pub tables_matched: usize,
    pub cells_written: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditReport {
    pub sections: Vec<SectionEditReport>,
}

impl EditReport {
    pub fn cells_written(&self) -> usize {
        self.sections.iter().map(|s| s.cells_written).sum()
    }

    pub fn tables_found(&self) -> usize {
        self.sections.iter().map(|s| s.tables_found).sum()
    }
}

/// The rewritten archive plus what happened to each section
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub bytes: Vec<u8>,
    pub report: EditReport,
}

/// Rewrite cell text of every table in an HWPX archive.
///
/// The Nth table across all sections (lexical section order, then document
/// order) takes the Nth target grid. Missing targets, rows and cells leave the
/// corresponding content untouched; extra ones are ignored.
pub fn apply_edits(archive_bytes: &[u8], targets: &[TableGrid]) -> Result<EditOutcome> {
    apply_edits_with(archive_bytes, targets, TierPreference::Auto)
}

pub fn apply_edits_with(
    archive_bytes: &[u8],
    targets: &[TableGrid],
    preference: TierPreference,
) -> Result<EditOutcome> {
    let mut archive = open_archive(Cursor::new(archive_bytes))?;

    let mut rewritten: Vec<(String, Vec<u8>)> = Vec::new();
    let mut report = EditReport::default();
    let mut base = 0;

    for name in sorted_section_names(&archive) {
        let original = match read_entry(&mut archive, &name) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("cannot read section {name}: {err}");
                report.sections.push(untouched(&name, 0, &err));
                continue;
            }
        };

        let (section_report, output) = edit_section(&name, &original, targets, base, preference);
        base += section_report.tables_found;
        report.sections.push(section_report);

        if let Some(bytes) = output {
            if bytes != original {
                rewritten.push((name, bytes));
            }
        }
    }

    let bytes = write_archive(&mut archive, &rewritten)?;
    log::info!(
        "rewrote {} cells in {} of {} sections",
        report.cells_written(),
        rewritten.len(),
        report.sections.len()
    );
    Ok(EditOutcome { bytes, report })
}

/// Edit an archive on disk, writing a fresh output file
pub fn apply_edits_to_file(
    input: &Path,
    targets: &[TableGrid],
    output: &Path,
    preference: TierPreference,
) -> Result<EditReport> {
    let bytes = std::fs::read(input)?;
    let outcome = apply_edits_with(&bytes, targets, preference)?;
    std::fs::write(output, &outcome.bytes)?;
    Ok(outcome.report)
}

fn edit_section(
    name: &str,
    original: &[u8],
    targets: &[TableGrid],
    base: usize,
    preference: TierPreference,
) -> (SectionEditReport, Option<Vec<u8>>) {
    let xml = match std::str::from_utf8(original) {
        Ok(xml) => xml,
        Err(err) => {
            let error = Error::SectionParse {
                section: name.to_string(),
                message: err.to_string(),
            };
            log::warn!("{error}");
            return (untouched(name, 0, &error), None);
        }
    };

    // The tree's table count is authoritative whenever the section parses,
    // since it is what the reader reported for this section.
    let mut known_tables = None;
    let mut fallback_detail = None;

    match TreeSection::parse(xml) {
        Ok(section) => {
            known_tables = Some(section.table_count);
            if preference == TierPreference::Auto {
                if section.is_verbatim(original) {
                    let tables_found = section.table_count;
                    match section.apply(targets, base) {
                        Ok((bytes, edits)) => {
                            return (
                                report(name, AppliedTier::Tree, tables_found, edits),
                                Some(bytes),
                            );
                        }
                        Err(err) => fallback_detail = Some(err.to_string()),
                    }
                } else {
                    log::debug!("{name}: tree does not round-trip verbatim, splicing");
                }
            }
        }
        Err(err) => {
            log::warn!("{name}: parse failed ({err}), falling back to splicing");
            fallback_detail = Some(err.to_string());
        }
    }

    match splice_section(xml, targets, base) {
        Ok(spliced) => {
            let tables_found = known_tables.unwrap_or(spliced.table_count);
            if tables_found != spliced.table_count {
                log::warn!(
                    "{name}: splice tier saw {} tables, tree saw {tables_found}",
                    spliced.table_count
                );
            }
            let mut section_report = report(name, AppliedTier::Splice, tables_found, spliced.edits);
            if known_tables.is_none() {
                section_report.reason = Some(ReasonCode::SectionParseError);
                section_report.detail = fallback_detail;
            }
            (section_report, Some(spliced.text.into_bytes()))
        }
        Err(err) => {
            log::warn!("{name}: left unchanged: {err}");
            let mut section_report = untouched_report(name, known_tables.unwrap_or(0));
            section_report.reason = Some(ReasonCode::SectionParseError);
            section_report.detail = Some(err.to_string());
            (section_report, None)
        }
    }
}

fn report(name: &str, tier: AppliedTier, tables_found: usize, edits: TableEdits) -> SectionEditReport {
    SectionEditReport {
        section: name.to_string(),
        tier,
        tables_found,
        tables_matched: edits.tables_matched,
        cells_written: edits.cells_written,
        reason: None,
        detail: None,
    }
}

fn untouched_report(name: &str, tables_found: usize) -> SectionEditReport {
    report(name, AppliedTier::Untouched, tables_found, TableEdits::default())
}

fn untouched(name: &str, tables_found: usize, error: &Error) -> SectionEditReport {
    let mut section_report = untouched_report(name, tables_found);
    section_report.reason = Some(error.reason());
    section_report.detail = Some(error.to_string());
    section_report
}

/// Copy every entry in its original order, replacing rewritten section parts.
///
/// Untouched entries are raw-copied so their compressed bytes are unchanged.
fn write_archive<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    rewritten: &[(String, Vec<u8>)],
) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for idx in 0..archive.len() {
        let replacement = {
            let entry = archive.by_index_raw(idx)?;
            let name = entry.name().to_string();
            rewritten
                .iter()
                .find(|(rewritten_name, _)| *rewritten_name == name && is_section_part(&name))
                .map(|(_, bytes)| {
                    let mut options =
                        SimpleFileOptions::default().compression_method(entry.compression());
                    if let Some(modified) = entry.last_modified() {
                        options = options.last_modified_time(modified);
                    }
                    if let Some(mode) = entry.unix_mode() {
                        options = options.unix_permissions(mode);
                    }
                    (name, options, bytes)
                })
        };

        match replacement {
            Some((name, options, bytes)) => {
                writer.start_file(name, options)?;
                writer.write_all(bytes)?;
            }
            None => {
                let entry = archive.by_index_raw(idx)?;
                writer.raw_copy_file(entry)?;
            }
        }
    }

    Ok(writer.finish()?.into_inner())
}
