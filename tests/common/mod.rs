//! Shared helpers for building HWPX archives in memory
#![allow(dead_code)]

use hwpdoc::TableGrid;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const HEADER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><hh:head xmlns:hh="http://www.hancom.co.kr/hwpml/2011/head" version="1.4"/>"#;

/// Archive with the usual package entries plus the given section parts
pub fn build_hwpx(sections: &[(&str, &str)]) -> Vec<u8> {
    build_hwpx_with(sections, CompressionMethod::Deflated)
}

pub fn build_hwpx_with(sections: &[(&str, &str)], method: CompressionMethod) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let options = SimpleFileOptions::default().compression_method(method);

    writer.start_file("mimetype", stored).unwrap();
    writer.write_all(b"application/hwp+zip").unwrap();

    writer.start_file("Contents/header.xml", options).unwrap();
    writer.write_all(HEADER_XML.as_bytes()).unwrap();

    for (name, xml) in sections {
        writer.start_file(*name, options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
    }

    writer.start_file("Preview/PrvText.txt", options).unwrap();
    writer.write_all("미리보기".as_bytes()).unwrap();

    writer.finish().unwrap().into_inner()
}

/// Wrap body content in a section root with a declaration
pub fn section_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><hs:sec xmlns:hs="http://www.hancom.co.kr/hwpml/2011/section" xmlns:hp="http://www.hancom.co.kr/hwpml/2011/paragraph">{body}</hs:sec>"#
    )
}

pub fn paragraph_xml(text: &str) -> String {
    format!(r#"<hp:p id="0" paraPrIDRef="0"><hp:run charPrIDRef="0"><hp:t>{text}</hp:t></hp:run></hp:p>"#)
}

pub fn cell_xml(text: &str) -> String {
    format!(
        r#"<hp:tc name="" header="0"><hp:subList id="" textDirection="HORIZONTAL"><hp:p id="0" paraPrIDRef="0"><hp:run charPrIDRef="0"><hp:t>{text}</hp:t></hp:run></hp:p></hp:subList><hp:cellSpan colSpan="1" rowSpan="1"/></hp:tc>"#
    )
}

/// A table inside its anchoring paragraph, one `t` per cell
pub fn table_xml(rows: &[&[&str]]) -> String {
    let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut xml = format!(
        r#"<hp:p id="1" paraPrIDRef="0"><hp:run charPrIDRef="0"><hp:tbl id="7" rowCnt="{}" colCnt="{cols}" cellSpacing="0">"#,
        rows.len()
    );
    for row in rows {
        xml.push_str("\n  <hp:tr>");
        for text in *row {
            xml.push_str(&cell_xml(text));
        }
        xml.push_str("</hp:tr>");
    }
    xml.push_str("\n</hp:tbl></hp:run></hp:p>");
    xml
}

pub fn grid(rows: &[&[&str]]) -> TableGrid {
    TableGrid::from_rows(
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
    )
}

pub fn read_entry(archive_bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut out = Vec::new();
    entry.read_to_end(&mut out).unwrap();
    out
}

pub fn read_entry_string(archive_bytes: &[u8], name: &str) -> String {
    String::from_utf8(read_entry(archive_bytes, name)).unwrap()
}

pub fn entry_names(archive_bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(archive_bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}
