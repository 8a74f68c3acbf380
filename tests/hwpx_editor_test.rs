mod common;

use common::*;
use hwpdoc::document::hwpx::{
    AppliedTier, TierPreference, apply_edits, apply_edits_to_file, apply_edits_with,
    parse_hwpx_bytes,
};
use hwpdoc::{Error, ReasonCode};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use zip::{CompressionMethod, ZipArchive};

const SECTION: &str = "Contents/section0.xml";

fn sample_section() -> String {
    format!(
        "{}\n{}\n{}",
        paragraph_xml("앞 문단"),
        table_xml(&[&["x", "y"], &["z", "w"]]),
        paragraph_xml("뒤 문단")
    )
}

fn sample_archive() -> (String, Vec<u8>) {
    let xml = section_xml(&sample_section());
    let bytes = build_hwpx(&[(SECTION, &xml)]);
    (xml, bytes)
}

#[test]
fn test_unedited_round_trip_is_byte_identical() {
    let (xml, bytes) = sample_archive();
    let document = parse_hwpx_bytes(&bytes).unwrap();
    assert_eq!(document.tables[0].rows, vec![vec!["x", "y"], vec!["z", "w"]]);

    let outcome = apply_edits(&bytes, &document.tables).unwrap();
    assert_eq!(read_entry_string(&outcome.bytes, SECTION), xml);
    assert_eq!(outcome.report.cells_written(), 0);
    assert_eq!(outcome.report.sections[0].tier, AppliedTier::Tree);

    let reparsed = parse_hwpx_bytes(&outcome.bytes).unwrap();
    assert_eq!(reparsed.tables[0].rows, document.tables[0].rows);
}

#[test]
fn test_edit_changes_only_the_cell_text() {
    let (xml, bytes) = sample_archive();
    let targets = vec![grid(&[&["a much longer value", "y"], &["z", "w"]])];

    let outcome = apply_edits(&bytes, &targets).unwrap();
    let edited = read_entry_string(&outcome.bytes, SECTION);

    let expected = xml.replacen("<hp:t>x</hp:t>", "<hp:t>a much longer value</hp:t>", 1);
    assert_eq!(edited, expected);

    let table_start = xml.find("<hp:tbl").unwrap();
    let tail = &xml[xml.find("</hp:tbl>").unwrap()..];
    assert_eq!(&edited[..table_start], &xml[..table_start]);
    assert!(edited.ends_with(tail));
    assert_eq!(outcome.report.cells_written(), 1);
}

#[test]
fn test_both_tiers_produce_the_same_edit() {
    let (_, bytes) = sample_archive();
    let targets = vec![grid(&[&["1", "2"], &["3", "4"]])];

    let tree = apply_edits_with(&bytes, &targets, TierPreference::Auto).unwrap();
    let splice = apply_edits_with(&bytes, &targets, TierPreference::Splice).unwrap();

    assert_eq!(tree.report.sections[0].tier, AppliedTier::Tree);
    assert_eq!(splice.report.sections[0].tier, AppliedTier::Splice);
    assert_eq!(
        read_entry(&tree.bytes, SECTION),
        read_entry(&splice.bytes, SECTION)
    );
    assert_eq!(splice.report.cells_written(), 4);
}

#[test]
fn test_partial_target_leaves_other_rows() {
    let (_, bytes) = sample_archive();
    let targets = vec![grid(&[&["new"]])];

    for tier in [TierPreference::Auto, TierPreference::Splice] {
        let outcome = apply_edits_with(&bytes, &targets, tier).unwrap();
        let table = &parse_hwpx_bytes(&outcome.bytes).unwrap().tables[0];
        assert_eq!(table.rows, vec![vec!["new", "y"], vec!["z", "w"]]);
    }
}

#[test]
fn test_extra_target_rows_and_tables_are_ignored() {
    let (_, bytes) = sample_archive();
    let targets = vec![
        grid(&[&["a", "b", "c"], &["d", "e", "f"], &["g", "h", "i"]]),
        grid(&[&["unmatched"]]),
    ];

    let outcome = apply_edits(&bytes, &targets).unwrap();
    let document = parse_hwpx_bytes(&outcome.bytes).unwrap();
    assert_eq!(document.tables.len(), 1);
    assert_eq!(document.tables[0].rows, vec![vec!["a", "b"], vec!["d", "e"]]);
}

#[test]
fn test_self_closing_run_gets_a_text_element() {
    let body = r#"<hp:tbl><hp:tr><hp:tc><hp:subList><hp:p><hp:run charPrIDRef="10"/></hp:p></hp:subList><hp:cellSpan colSpan="1" rowSpan="1"/></hp:tc></hp:tr></hp:tbl>"#;
    let xml = section_xml(body);
    let bytes = build_hwpx(&[(SECTION, &xml)]);
    let expected = xml.replace(
        r#"<hp:run charPrIDRef="10"/>"#,
        r#"<hp:run charPrIDRef="10"><hp:t>v</hp:t></hp:run>"#,
    );

    for tier in [TierPreference::Auto, TierPreference::Splice] {
        let outcome = apply_edits_with(&bytes, &[grid(&[&["v"]])], tier).unwrap();
        assert_eq!(read_entry_string(&outcome.bytes, SECTION), expected);
    }
}

#[test]
fn test_empty_cell_left_alone_when_value_is_empty() {
    let body = r#"<hp:tbl><hp:tr><hp:tc><hp:p><hp:run/></hp:p></hp:tc><hp:tc><hp:p><hp:run><hp:t>b</hp:t></hp:run></hp:p></hp:tc></hp:tr></hp:tbl>"#;
    let xml = section_xml(body);
    let bytes = build_hwpx(&[(SECTION, &xml)]);

    let targets = parse_hwpx_bytes(&bytes).unwrap().tables;
    assert_eq!(targets[0].rows, vec![vec!["", "b"]]);

    let outcome = apply_edits(&bytes, &targets).unwrap();
    assert_eq!(read_entry_string(&outcome.bytes, SECTION), xml);
}

#[test]
fn test_reapplying_parsed_grid_keeps_inline_markup_in_both_tiers() {
    let body = r#"<hp:tbl><hp:tr><hp:tc><hp:p><hp:run><hp:t>a<hp:lineBreak/>b</hp:t></hp:run></hp:p></hp:tc><hp:tc><hp:p><hp:run><hp:t/></hp:run></hp:p></hp:tc></hp:tr></hp:tbl>"#;
    let xml = section_xml(body);
    let bytes = build_hwpx(&[(SECTION, &xml)]);

    let targets = parse_hwpx_bytes(&bytes).unwrap().tables;
    assert_eq!(targets[0].rows, vec![vec!["ab", ""]]);

    for tier in [TierPreference::Auto, TierPreference::Splice] {
        let outcome = apply_edits_with(&bytes, &targets, tier).unwrap();
        assert_eq!(read_entry_string(&outcome.bytes, SECTION), xml);
        assert_eq!(outcome.report.cells_written(), 0);
    }
}

#[test]
fn test_rows_without_cells_do_not_take_a_target_row() {
    let body = format!(
        "<hp:tbl><hp:tr/><hp:tr>{}</hp:tr></hp:tbl><hp:tbl><hp:tr></hp:tr></hp:tbl><hp:tbl><hp:tr>{}</hp:tr></hp:tbl>",
        cell_xml("a"),
        cell_xml("b")
    );
    let xml = section_xml(&body);
    let bytes = build_hwpx(&[(SECTION, &xml)]);
    let targets = vec![grid(&[&["A"]]), grid(&[&["B"]])];
    let expected = xml
        .replacen("<hp:t>a</hp:t>", "<hp:t>A</hp:t>", 1)
        .replacen("<hp:t>b</hp:t>", "<hp:t>B</hp:t>", 1);

    for tier in [TierPreference::Auto, TierPreference::Splice] {
        let outcome = apply_edits_with(&bytes, &targets, tier).unwrap();
        assert_eq!(read_entry_string(&outcome.bytes, SECTION), expected);
        assert_eq!(outcome.report.cells_written(), 2);
    }
}

#[test]
fn test_cell_without_run_is_synthesized_only_by_tree_tier() {
    let body = r#"<hp:tbl><hp:tr><hp:tc><hp:cellSpan colSpan="1" rowSpan="1"/></hp:tc></hp:tr></hp:tbl>"#;
    let xml = section_xml(body);
    let bytes = build_hwpx(&[(SECTION, &xml)]);
    let targets = vec![grid(&[&["v"]])];

    let tree = apply_edits(&bytes, &targets).unwrap();
    assert_eq!(
        read_entry_string(&tree.bytes, SECTION),
        xml.replace(
            r#"<hp:cellSpan colSpan="1" rowSpan="1"/></hp:tc>"#,
            r#"<hp:cellSpan colSpan="1" rowSpan="1"/><hp:run><hp:t>v</hp:t></hp:run></hp:tc>"#,
        )
    );

    let splice = apply_edits_with(&bytes, &targets, TierPreference::Splice).unwrap();
    assert_eq!(read_entry_string(&splice.bytes, SECTION), xml);
    assert_eq!(splice.report.cells_written(), 0);
}

#[test]
fn test_cell_text_is_escaped() {
    let (_, bytes) = sample_archive();
    let targets = vec![grid(&[&["a<b & c"]])];

    for tier in [TierPreference::Auto, TierPreference::Splice] {
        let outcome = apply_edits_with(&bytes, &targets, tier).unwrap();
        let edited = read_entry_string(&outcome.bytes, SECTION);
        assert!(edited.contains("<hp:t>a&lt;b &amp; c</hp:t>"));
        let table = &parse_hwpx_bytes(&outcome.bytes).unwrap().tables[0];
        assert_eq!(table.cell(0, 0), "a<b & c");
    }
}

#[test]
fn test_non_verbatim_section_falls_back_to_splicing() {
    // the space in the end tag does not survive a tree round trip
    let xml = section_xml(&table_xml(&[&["x"]])).replace("</hp:tr>", "</hp:tr >");
    let bytes = build_hwpx(&[(SECTION, &xml)]);

    let outcome = apply_edits(&bytes, &[grid(&[&["edited"]])]).unwrap();
    assert_eq!(outcome.report.sections[0].tier, AppliedTier::Splice);
    assert_eq!(
        read_entry_string(&outcome.bytes, SECTION),
        xml.replace("<hp:t>x</hp:t>", "<hp:t>edited</hp:t>")
    );
}

#[test]
fn test_unbalanced_section_is_copied_unchanged() {
    let broken = section_xml("<hp:tbl><hp:tr><hp:tc><hp:run><hp:t>x</hp:t></hp:run>");
    let good = section_xml(&table_xml(&[&["y"]]));
    let bytes = build_hwpx(&[
        ("Contents/section0.xml", &broken),
        ("Contents/section1.xml", &good),
    ]);

    let outcome = apply_edits(&bytes, &[grid(&[&["edited"]])]).unwrap();
    assert_eq!(read_entry_string(&outcome.bytes, "Contents/section0.xml"), broken);
    assert_eq!(
        read_entry_string(&outcome.bytes, "Contents/section1.xml"),
        good.replace("<hp:t>y</hp:t>", "<hp:t>edited</hp:t>")
    );

    let first = &outcome.report.sections[0];
    assert_eq!(first.tier, AppliedTier::Untouched);
    assert_eq!(first.reason, Some(ReasonCode::SectionParseError));
    assert_eq!(outcome.report.sections[1].tier, AppliedTier::Tree);
}

#[test]
fn test_tables_are_numbered_across_sections() {
    let bytes = build_hwpx(&[
        ("Contents/section0.xml", &section_xml(&table_xml(&[&["a"]]))),
        (
            "Contents/section1.xml",
            &section_xml(&format!("{}{}", table_xml(&[&["b"]]), table_xml(&[&["c"]]))),
        ),
    ]);
    let targets = vec![grid(&[&["a"]]), grid(&[&["b"]]), grid(&[&["C!"]])];

    let outcome = apply_edits(&bytes, &targets).unwrap();
    let tables = parse_hwpx_bytes(&outcome.bytes).unwrap().tables;
    let firsts: Vec<&str> = tables.iter().map(|t| t.cell(0, 0)).collect();
    assert_eq!(firsts, vec!["a", "b", "C!"]);
    assert_eq!(outcome.report.tables_found(), 3);
    assert_eq!(outcome.report.cells_written(), 1);
}

#[test]
fn test_nested_tables_are_skipped_by_splicing() {
    let inner = r#"<hp:tbl><hp:tr><hp:tc><hp:run><hp:t>inner</hp:t></hp:run></hp:tc></hp:tr></hp:tbl>"#;
    let outer = format!(
        r#"<hp:tbl><hp:tr><hp:tc><hp:run><hp:t>outer</hp:t></hp:run>{inner}</hp:tc></hp:tr></hp:tbl>"#
    );
    let after = table_xml(&[&["last"]]);
    let xml = section_xml(&format!("{outer}{after}"));
    let bytes = build_hwpx(&[(SECTION, &xml)]);

    let document = parse_hwpx_bytes(&bytes).unwrap();
    assert_eq!(document.tables.len(), 3);

    let targets = vec![grid(&[&["O"]]), grid(&[&["I"]]), grid(&[&["L"]])];
    let outcome = apply_edits_with(&bytes, &targets, TierPreference::Splice).unwrap();
    let edited = read_entry_string(&outcome.bytes, SECTION);
    assert_eq!(edited, xml.replace("<hp:t>last</hp:t>", "<hp:t>L</hp:t>"));
    assert_eq!(outcome.report.sections[0].tables_found, 3);
}

#[test]
fn test_other_entries_are_preserved() {
    let xml = section_xml(&table_xml(&[&["x"]]));
    let bytes = build_hwpx_with(&[(SECTION, &xml)], CompressionMethod::Stored);

    let outcome = apply_edits(&bytes, &[grid(&[&["y"]])]).unwrap();
    assert_eq!(entry_names(&outcome.bytes), entry_names(&bytes));
    for name in ["mimetype", "Contents/header.xml", "Preview/PrvText.txt"] {
        assert_eq!(read_entry(&outcome.bytes, name), read_entry(&bytes, name));
    }

    let mut archive = ZipArchive::new(Cursor::new(outcome.bytes.as_slice())).unwrap();
    let section = archive.by_name(SECTION).unwrap();
    assert_eq!(section.compression(), CompressionMethod::Stored);
}

#[test]
fn test_unreadable_archive_is_fatal() {
    let err = apply_edits(b"definitely not a zip", &[]).unwrap_err();
    assert!(matches!(err, Error::ArchiveOpen(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_apply_to_file_writes_fresh_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.hwpx");
    let output = dir.path().join("out.hwpx");
    let (_, bytes) = sample_archive();
    std::fs::write(&input, &bytes).unwrap();

    let report = apply_edits_to_file(
        &input,
        &[grid(&[&["q"]])],
        &output,
        TierPreference::Auto,
    )
    .unwrap();
    assert_eq!(report.cells_written(), 1);
    assert_eq!(std::fs::read(&input).unwrap(), bytes);

    let edited = std::fs::read(&output).unwrap();
    assert_eq!(parse_hwpx_bytes(&edited).unwrap().tables[0].cell(0, 0), "q");
}
