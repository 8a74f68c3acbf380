mod common;

use common::*;
use hwpdoc::document::hwpx::parse_hwpx_bytes;
use hwpdoc::document::is_hwpx_bytes;
use hwpdoc::{Error, ReasonCode};
use pretty_assertions::assert_eq;

#[test]
fn test_reads_text_and_tables() {
    let body = format!(
        "{}{}",
        paragraph_xml("제목"),
        table_xml(&[&["x", "y"], &["z", "w"]])
    );
    let bytes = build_hwpx(&[("Contents/section0.xml", &section_xml(&body))]);

    let document = parse_hwpx_bytes(&bytes).unwrap();
    assert_eq!(document.tables.len(), 1);
    assert_eq!(document.tables[0], {
        let mut expected = grid(&[&["x", "y"], &["z", "w"]]);
        expected.cell_spans = document.tables[0].cell_spans.clone();
        expected
    });
    assert_eq!(document.text, "제목xyzw");
    assert_eq!(document.sections.len(), 1);
    assert_eq!(document.sections[0].source_name, "Contents/section0.xml");
    assert!(document.file_list.contains(&"Preview/PrvText.txt".to_string()));
}

#[test]
fn test_grid_shape_is_normalized() {
    let body = table_xml(&[&["a", "b", "c"], &["d"]]);
    let bytes = build_hwpx(&[("Contents/section0.xml", &section_xml(&body))]);

    let table = &parse_hwpx_bytes(&bytes).unwrap().tables[0];
    assert_eq!(table.row_count, table.rows.len());
    assert_eq!(table.col_count, 3);
    assert!(table.rows.iter().all(|row| row.len() == table.col_count));
    assert_eq!(table.rows[1], vec!["d", "", ""]);
}

#[test]
fn test_cell_spans_are_recorded() {
    let body = section_xml(
        r#"<hp:tbl><hp:tr><hp:tc><hp:subList><hp:p><hp:run><hp:t>merged</hp:t></hp:run></hp:p></hp:subList><hp:cellSpan colSpan="2" rowSpan="3"/></hp:tc></hp:tr></hp:tbl>"#,
    );
    let bytes = build_hwpx(&[("Contents/section0.xml", &body)]);

    let table = &parse_hwpx_bytes(&bytes).unwrap().tables[0];
    let span = &table.cell_spans.as_ref().unwrap()[0][0];
    assert_eq!((span.colspan, span.rowspan), (2, 3));
    assert_eq!(span.text, "merged");
}

#[test]
fn test_sections_follow_lexical_name_order() {
    let bytes = build_hwpx(&[
        ("Contents/section2.xml", &section_xml(&table_xml(&[&["two"]]))),
        ("Contents/section10.xml", &section_xml(&table_xml(&[&["ten"]]))),
        ("Contents/section0.xml", &section_xml(&table_xml(&[&["zero"]]))),
    ]);

    let document = parse_hwpx_bytes(&bytes).unwrap();
    let firsts: Vec<&str> = document.tables.iter().map(|t| t.cell(0, 0)).collect();
    assert_eq!(firsts, vec!["zero", "ten", "two"]);
    assert_eq!(document.text, "zero\nten\ntwo");
}

#[test]
fn test_malformed_section_is_isolated() {
    let bytes = build_hwpx(&[
        ("Contents/section0.xml", "<hs:sec><hp:p><hp:t>broken</hp:p>"),
        ("Contents/section1.xml", &section_xml(&table_xml(&[&["ok"]]))),
    ]);

    let document = parse_hwpx_bytes(&bytes).unwrap();
    assert_eq!(document.tables.len(), 1);
    assert_eq!(document.tables[0].cell(0, 0), "ok");

    let failures: Vec<_> = document.section_failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "Contents/section0.xml");
    assert_eq!(failures[0].1.reason, ReasonCode::SectionParseError);
}

#[test]
fn test_archive_without_sections_is_empty() {
    let bytes = build_hwpx(&[]);
    let document = parse_hwpx_bytes(&bytes).unwrap();
    assert!(document.text.is_empty());
    assert!(document.tables.is_empty());
    assert!(is_hwpx_bytes(&bytes));
}

#[test]
fn test_tables_without_rows_are_dropped() {
    let body = section_xml("<hp:tbl rowCnt=\"0\"></hp:tbl><hp:tbl/>");
    let bytes = build_hwpx(&[("Contents/section0.xml", &body)]);
    assert!(parse_hwpx_bytes(&bytes).unwrap().tables.is_empty());
}

#[test]
fn test_rows_without_cells_are_skipped() {
    let body = format!(
        "<hp:tbl><hp:tr/><hp:tr>{}</hp:tr><hp:tr></hp:tr></hp:tbl><hp:tbl><hp:tr></hp:tr></hp:tbl>",
        cell_xml("only")
    );
    let bytes = build_hwpx(&[("Contents/section0.xml", &section_xml(&body))]);
    let tables = parse_hwpx_bytes(&bytes).unwrap().tables;

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].rows, vec![vec!["only"]]);
    assert_eq!(tables[0].row_count, 1);
}

#[test]
fn test_not_an_archive() {
    let err = parse_hwpx_bytes(b"PK but not really").unwrap_err();
    assert!(matches!(err, Error::ArchiveOpen(_)));
    assert_eq!(err.reason(), ReasonCode::ArchiveOpenError);
}
