//! File I/O, container detection and table interchange
//!
//! This module handles file-kind detection, reading archive entries, and the
//! JSON / CSV interchange forms of [`TableGrid`] lists.

use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use super::models::*;
use crate::error::{Error, Result};

/// Byte-order mark expected by spreadsheet applications for UTF-8 CSV
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// OLE compound-document signature that legacy documents start with
const OLE_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// True when the bytes form a ZIP archive with a `Contents/` entry
pub fn is_hwpx_bytes(bytes: &[u8]) -> bool {
    match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => has_contents_dir(&archive),
        Err(_) => false,
    }
}

pub fn is_hwpx_file(file_path: &Path) -> bool {
    let Ok(file) = File::open(file_path) else {
        return false;
    };
    match ZipArchive::new(file) {
        Ok(archive) => has_contents_dir(&archive),
        Err(_) => false,
    }
}

fn has_contents_dir<R: Read + Seek>(archive: &ZipArchive<R>) -> bool {
    archive.file_names().any(|name| name.contains("Contents/"))
}

/// Classify a document by content, falling back to its extension
pub fn detect_file_kind(file_path: &Path) -> Result<FileKind> {
    if is_hwpx_file(file_path) {
        return Ok(FileKind::Hwpx);
    }

    let mut header = [0u8; 8];
    let mut file = File::open(file_path)?;
    let read = file.read(&mut header)?;
    if read == OLE_SIGNATURE.len() && header == OLE_SIGNATURE {
        return Ok(FileKind::Hwp);
    }

    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "hwp" => Ok(FileKind::Hwp),
        // opening it will report the archive error
        "hwpx" => Ok(FileKind::Hwpx),
        other => Err(Error::Decode(format!(
            "unsupported file format .{other}: expected .hwp or .hwpx"
        ))),
    }
}

/// Section parts hold body content; everything else in the archive is metadata
pub fn is_section_part(name: &str) -> bool {
    name.to_ascii_lowercase().contains("section") && name.ends_with(".xml")
}

/// Open an archive, mapping failure to the fatal `ArchiveOpen` error
pub(crate) fn open_archive<R: Read + Seek>(reader: R) -> Result<ZipArchive<R>> {
    ZipArchive::new(reader).map_err(Error::ArchiveOpen)
}

/// Section part names in lexical order, which is taken to be reading order
pub(crate) fn sorted_section_names<R: Read + Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| is_section_part(name))
        .map(str::to_string)
        .collect();
    names.sort();
    names
}

/// Read one archive entry fully
pub(crate) fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive.by_name(name)?;
    let mut content = Vec::new();
    entry.read_to_end(&mut content)?;
    Ok(content)
}

pub fn tables_to_json(tables: &[TableGrid], pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(tables)?
    } else {
        serde_json::to_string(tables)?
    };
    Ok(json)
}

/// Parse the ordered-list interchange form, normalizing each grid
pub fn tables_from_json(json: &str) -> Result<Vec<TableGrid>> {
    let mut tables: Vec<TableGrid> = serde_json::from_str(json)?;
    for table in &mut tables {
        table.normalize();
    }
    Ok(tables)
}

pub fn save_tables_json(tables: &[TableGrid], path: &Path, pretty: bool) -> Result<()> {
    fs::write(path, tables_to_json(tables, pretty)?)?;
    Ok(())
}

pub fn load_tables_json(path: &Path) -> Result<Vec<TableGrid>> {
    tables_from_json(&fs::read_to_string(path)?)
}

/// Write one grid as comma-separated rows, optionally prefixed with a UTF-8 BOM
pub fn write_csv<W: Write>(grid: &TableGrid, mut writer: W, bom: bool) -> Result<()> {
    if bom {
        writer.write_all(UTF8_BOM)?;
    }

    let mut csv_writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);
    for row in &grid.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export every grid to `table_{n}.csv` (1-based) under `dir`
pub fn export_csv_dir(tables: &[TableGrid], dir: &Path, bom: bool) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(tables.len());
    for (idx, table) in tables.iter().enumerate() {
        let path = dir.join(format!("table_{}.csv", idx + 1));
        let file = File::create(&path)?;
        write_csv(table, file, bom)?;
        log::info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
