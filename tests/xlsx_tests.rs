#![cfg(feature = "xlsx")]

use std::io::{Cursor, Write};

use tust::core::TustError;
use tust::xlsx::{self, CellRef};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const MAIN_NS: &str = tust::xlsx::SPREADSHEETML_NS;

fn container(parts: &[(&str, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in parts {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn shared(strings: &[&str]) -> String {
    let items: String = strings.iter().map(|s| format!("<si><t>{s}</t></si>")).collect();
    format!(r#"<sst xmlns="{MAIN_NS}" count="{n}">{items}</sst>"#, n = strings.len())
}

fn sheet(cells: &str) -> String {
    format!(r#"<worksheet xmlns="{MAIN_NS}"><sheetData>{cells}</sheetData></worksheet>"#)
}

#[test]
fn decodes_shared_inline_and_numeric_cells() {
    let bytes = container(&[
        ("xl/sharedStrings.xml", shared(&["Outubro/2025", "EMP01"])),
        (
            "xl/worksheets/sheet1.xml",
            sheet(concat!(
                r#"<row r="1"><c r="D1"><v>1234</v></c></row>"#,
                r#"<row r="2"><c r="A2" t="s"><v>1</v></c>"#,
                r#"<c r="B2" t="inlineStr"><is><t>Empresa Um</t></is></c>"#,
                r#"<c r="D2" t="s"><v>0</v></c></row>"#,
            )),
        ),
    ]);

    let table = xlsx::read_workbook(&bytes).unwrap();
    assert_eq!(table.get(1, "D"), Some("1234"));
    assert_eq!(table.get(2, "A"), Some("EMP01"));
    assert_eq!(table.get(2, "B"), Some("Empresa Um"));
    assert_eq!(table.get(2, "D"), Some("Outubro/2025"));
    assert_eq!(table.get(2, "C"), None);
}

#[test]
fn rich_text_runs_are_concatenated() {
    let sst = format!(
        r#"<sst xmlns="{MAIN_NS}"><si><r><t>Transmissora </t></r><r><t>Norte</t></r></si></sst>"#
    );
    let bytes = container(&[
        ("xl/sharedStrings.xml", sst),
        (
            "xl/worksheets/sheet1.xml",
            sheet(r#"<row r="6"><c r="B6" t="s"><v>0</v></c></row>"#),
        ),
    ]);
    let table = xlsx::read_workbook(&bytes).unwrap();
    assert_eq!(table.get(6, "B"), Some("Transmissora Norte"));
}

#[test]
fn escaped_text_is_unescaped() {
    let bytes = container(&[
        ("xl/sharedStrings.xml", shared(&["A &amp; B"])),
        (
            "xl/worksheets/sheet1.xml",
            sheet(r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#),
        ),
    ]);
    let table = xlsx::read_workbook(&bytes).unwrap();
    assert_eq!(table.get(1, "A"), Some("A & B"));
}

#[test]
fn rows_iterate_in_order() {
    let bytes = container(&[
        ("xl/sharedStrings.xml", shared(&[])),
        (
            "xl/worksheets/sheet1.xml",
            sheet(concat!(
                r#"<row r="7"><c r="A7"><v>2</v></c></row>"#,
                r#"<row r="6"><c r="A6"><v>1</v></c></row>"#,
            )),
        ),
    ]);
    let table = xlsx::read_workbook(&bytes).unwrap();
    let rows: Vec<u32> = table.rows().map(|(r, _)| r).collect();
    assert_eq!(rows, vec![6, 7]);
}

#[test]
fn missing_shared_strings_is_malformed() {
    let bytes = container(&[(
        "xl/worksheets/sheet1.xml",
        sheet(r#"<row r="1"><c r="A1"><v>1</v></c></row>"#),
    )]);
    let err = xlsx::read_workbook(&bytes).unwrap_err();
    assert!(err.is_malformed());
    assert!(err.to_string().contains("xl/sharedStrings.xml"));
}

#[test]
fn missing_sheet_is_malformed() {
    let bytes = container(&[("xl/sharedStrings.xml", shared(&["x"]))]);
    let err = xlsx::read_workbook(&bytes).unwrap_err();
    assert!(err.to_string().contains("xl/worksheets/sheet1.xml"));
}

#[test]
fn shared_index_out_of_range_is_malformed() {
    let bytes = container(&[
        ("xl/sharedStrings.xml", shared(&["only"])),
        (
            "xl/worksheets/sheet1.xml",
            sheet(r#"<row r="1"><c r="A1" t="s"><v>5</v></c></row>"#),
        ),
    ]);
    let err = xlsx::read_workbook(&bytes).unwrap_err();
    assert!(matches!(err, TustError::MalformedDocument(_)));
}

#[test]
fn not_a_zip_is_malformed() {
    let err = xlsx::read_workbook(b"plain text, not a container").unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn worksheet_cut_between_elements_is_malformed() {
    let bytes = container(&[
        ("xl/sharedStrings.xml", shared(&[])),
        (
            "xl/worksheets/sheet1.xml",
            format!(
                r#"<worksheet xmlns="{MAIN_NS}"><sheetData><row r="1"><c r="A1"><v>1</v></c></row>"#
            ),
        ),
    ]);
    let err = xlsx::read_workbook(&bytes).unwrap_err();
    assert!(err.is_malformed());
    assert!(err.to_string().contains("xl/worksheets/sheet1.xml"));
}

#[test]
fn shared_strings_cut_short_is_malformed() {
    let bytes = container(&[
        ("xl/sharedStrings.xml", format!(r#"<sst xmlns="{MAIN_NS}"><si><t>x</t>"#)),
        (
            "xl/worksheets/sheet1.xml",
            sheet(r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#),
        ),
    ]);
    assert!(xlsx::read_workbook(&bytes).unwrap_err().is_malformed());
}

/// Overwrite the uncompressed size recorded for `name` in both the local and
/// the central directory headers.
fn declare_size(bytes: &mut [u8], name: &str, size: u32) {
    let name = name.as_bytes();
    let le16 = |b: &[u8], at: usize| u16::from_le_bytes([b[at], b[at + 1]]) as usize;
    let mut i = 0;
    while i + 4 <= bytes.len() {
        let (name_len_at, name_at, size_at) = match &bytes[i..i + 4] {
            b"PK\x03\x04" => (i + 26, i + 30, i + 22),
            b"PK\x01\x02" => (i + 28, i + 46, i + 24),
            _ => {
                i += 1;
                continue;
            }
        };
        let len = le16(bytes, name_len_at);
        if bytes.get(name_at..name_at + len) == Some(name) {
            bytes[size_at..size_at + 4].copy_from_slice(&size.to_le_bytes());
        }
        i += 4;
    }
}

#[test]
fn inflated_declared_size_is_rejected() {
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("xl/sharedStrings.xml", stored).unwrap();
    zip.write_all(shared(&["x"]).as_bytes()).unwrap();
    zip.start_file("xl/worksheets/sheet1.xml", stored).unwrap();
    zip.write_all(sheet(r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#).as_bytes()).unwrap();
    let mut bytes = zip.finish().unwrap().into_inner();

    declare_size(&mut bytes, "xl/sharedStrings.xml", 0x7FFF_FFFF);
    let err = xlsx::read_workbook(&bytes).unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn cell_reference_parsing() {
    let r = CellRef::parse("AB12").unwrap();
    assert_eq!(r.column, "AB");
    assert_eq!(r.row, 12);
    assert_eq!(CellRef::parse("$D$1").unwrap().to_string(), "D1");
    assert!(CellRef::parse("12").is_err());
    assert!(CellRef::parse("A0").is_err());
}

#[test]
fn file_errors_name_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"garbage").unwrap();
    let err = xlsx::read_workbook_file(&path).unwrap_err();
    assert!(err.to_string().contains("broken.xlsx"));

    let missing = xlsx::read_workbook_file(dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(missing, TustError::Io(_)));
}
