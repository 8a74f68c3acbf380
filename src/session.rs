//! Session bookkeeping around the extraction and editing core
//!
//! A session remembers one ingested document: where it came from, what kind
//! it is, and its current text and (possibly edited) tables. The store is
//! pluggable; [`MemorySessionStore`] keeps everything in a map keyed by
//! random UUIDs. Concurrent writers to one id are not arbitrated here, the
//! last `put` wins.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::document::hwp::StructuralDecoder;
use crate::document::hwpx::{EditOutcome, TierPreference, apply_edits_with};
use crate::document::{FileKind, TableGrid, load_document, set_cell};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub original_path: PathBuf,
    pub kind: FileKind,
    pub text: Option<String>,
    pub tables: Vec<TableGrid>,
}

pub trait SessionStore {
    fn put(&mut self, id: &str, data: SessionData);
    fn get(&self, id: &str) -> Option<SessionData>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: HashMap<String, SessionData>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&mut self, id: &str, data: SessionData) {
        self.entries.insert(id.to_string(), data);
    }

    fn get(&self, id: &str) -> Option<SessionData> {
        self.entries.get(id).cloned()
    }
}

/// Operations on sessions held in a [`SessionStore`]
pub struct Sessions<S: SessionStore> {
    store: S,
    tier: TierPreference,
}

impl<S: SessionStore> Sessions<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            tier: TierPreference::Auto,
        }
    }

    pub fn with_tier(mut self, tier: TierPreference) -> Self {
        self.tier = tier;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read a document and open a session for it, returning the new id
    pub fn ingest(&mut self, path: &Path, decoder: &dyn StructuralDecoder) -> Result<String> {
        let loaded = load_document(path, decoder)?;
        let id = Uuid::new_v4().to_string();
        log::info!(
            "session {id}: {} tables from {}",
            loaded.tables.len(),
            path.display()
        );

        self.store.put(
            &id,
            SessionData {
                original_path: path.to_path_buf(),
                kind: loaded.kind,
                text: loaded.text,
                tables: loaded.tables,
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<SessionData> {
        self.store
            .get(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    pub fn text(&self, id: &str) -> Result<Option<String>> {
        Ok(self.get(id)?.text)
    }

    pub fn tables(&self, id: &str) -> Result<Vec<TableGrid>> {
        Ok(self.get(id)?.tables)
    }

    pub fn replace_tables(&mut self, id: &str, tables: Vec<TableGrid>) -> Result<()> {
        let mut data = self.get(id)?;
        data.tables = tables;
        self.store.put(id, data);
        Ok(())
    }

    /// Assign one cell; on error the stored tables are left as they were
    pub fn edit_cell(
        &mut self,
        id: &str,
        table: usize,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<()> {
        let mut data = self.get(id)?;
        set_cell(&mut data.tables, table, row, col, value)?;
        self.store.put(id, data);
        Ok(())
    }

    /// Write the session's tables into a copy of its original archive
    pub fn export_hwpx(&self, id: &str) -> Result<EditOutcome> {
        let data = self.get(id)?;
        if data.kind != FileKind::Hwpx {
            return Err(Error::Unsupported(
                "legacy documents cannot be written back".to_string(),
            ));
        }
        let bytes = std::fs::read(&data.original_path)?;
        apply_edits_with(&bytes, &data.tables, self.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::hwp::UnconfiguredDecoder;
    use crate::error::ReasonCode;

    fn seeded() -> (Sessions<MemorySessionStore>, String) {
        let mut sessions = Sessions::new(MemorySessionStore::new());
        let id = Uuid::new_v4().to_string();
        sessions.store.put(
            &id,
            SessionData {
                original_path: PathBuf::from("doc.hwp"),
                kind: FileKind::Hwp,
                text: Some("body".to_string()),
                tables: vec![TableGrid::from_rows(vec![vec!["a".to_string(); 3]])],
            },
        );
        (sessions, id)
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let (mut sessions, _) = seeded();
        let missing = "00000000-0000-0000-0000-000000000000";

        for err in [
            sessions.tables(missing).unwrap_err(),
            sessions.text(missing).unwrap_err(),
            sessions.edit_cell(missing, 0, 0, 0, "v").unwrap_err(),
            sessions.replace_tables(missing, Vec::new()).unwrap_err(),
            sessions.export_hwpx(missing).unwrap_err(),
        ] {
            assert_eq!(err.reason(), ReasonCode::SessionNotFound);
        }
    }

    #[test]
    fn test_edit_cell_extends_row() {
        let (mut sessions, id) = seeded();
        sessions.edit_cell(&id, 0, 0, 5, "v").unwrap();

        let tables = sessions.tables(&id).unwrap();
        assert_eq!(tables[0].rows[0], vec!["a", "a", "a", "", "", "v"]);
        assert_eq!(tables[0].col_count, 6);
    }

    #[test]
    fn test_failed_edit_leaves_tables() {
        let (mut sessions, id) = seeded();
        let err = sessions.edit_cell(&id, 3, 0, 0, "v").unwrap_err();
        assert!(matches!(err, Error::TableIndexOutOfRange { index: 3, len: 1 }));
        assert_eq!(sessions.tables(&id).unwrap()[0].rows[0], vec!["a"; 3]);
    }

    #[test]
    fn test_legacy_sessions_are_read_only() {
        let (sessions, id) = seeded();
        assert!(matches!(sessions.export_hwpx(&id), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_ingest_missing_file_fails() {
        let mut sessions = Sessions::new(MemorySessionStore::new());
        let result = sessions.ingest(Path::new("/nonexistent/file.hwp"), &UnconfiguredDecoder);
        assert!(result.is_err());
        assert!(sessions.store().is_empty());
    }
}
