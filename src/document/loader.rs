//! Document loading and orchestration
//!
//! `load_document()` picks the reader for a file and flattens its output to
//! the text + tables view shared by sessions and the CLI.

use serde::Serialize;
use std::path::Path;

use super::hwp::{StructuralDecoder, read_hwp};
use super::hwpx::parse_hwpx_file;
use super::io::detect_file_kind;
use super::models::*;
use crate::error::{ReasonCode, Result};

/// Text and tables of one document, plus why anything is missing
#[derive(Debug, Clone, Serialize)]
pub struct LoadedDocument {
    pub kind: FileKind,
    /// `None` when a legacy document could not be decoded
    pub text: Option<String>,
    pub tables: Vec<TableGrid>,
    /// One entry per degraded unit (a failed section, an unusable decoder)
    pub reasons: Vec<(String, ReasonCode)>,
}

/// Load a document of either kind.
///
/// Fails only when the file cannot be read or a modern-format archive cannot
/// be opened. Legacy decoding problems degrade to an empty result with a
/// reason attached.
pub fn load_document(file_path: &Path, decoder: &dyn StructuralDecoder) -> Result<LoadedDocument> {
    let kind = detect_file_kind(file_path)?;
    log::info!("loading {} as {kind:?}", file_path.display());

    match kind {
        FileKind::Hwpx => {
            let document = parse_hwpx_file(file_path)?;
            let reasons = document
                .section_failures()
                .map(|(name, failure)| (name.to_string(), failure.reason))
                .collect();
            Ok(LoadedDocument {
                kind,
                text: Some(document.text),
                tables: document.tables,
                reasons,
            })
        }
        FileKind::Hwp => {
            let extraction = read_hwp(decoder, file_path);
            let reasons = extraction
                .reason
                .map(|reason| (file_path.display().to_string(), reason))
                .into_iter()
                .collect();
            Ok(LoadedDocument {
                kind,
                text: extraction.text,
                tables: extraction.tables,
                reasons,
            })
        }
    }
}
