use std::fmt::Display;
use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use super::cells::{CellRef, RawCellTable};
use super::{FIRST_SHEET_PART, MAX_PART_SIZE, SHARED_STRINGS_PART};
use crate::core::TustError;

/// Decode the first worksheet of an xlsx container into a [`RawCellTable`].
///
/// Only the shared-string part and the first worksheet part are read; both
/// are required.
pub fn read_workbook(container: &[u8]) -> Result<RawCellTable, TustError> {
    let mut archive = ZipArchive::new(Cursor::new(container))
        .map_err(|e| TustError::malformed(format!("not a zip container: {e}")))?;

    let shared_xml = read_part(&mut archive, SHARED_STRINGS_PART)?;
    let sheet_xml = read_part(&mut archive, FIRST_SHEET_PART)?;
    drop(archive);

    let shared = parse_shared_strings(&shared_xml)?;
    let table = parse_sheet(&sheet_xml, &shared)?;
    debug!(
        shared_strings = shared.len(),
        rows = table.len(),
        "decoded worksheet"
    );
    Ok(table)
}

/// Read an xlsx file from disk and decode it with [`read_workbook`].
pub fn read_workbook_file(path: impl AsRef<Path>) -> Result<RawCellTable, TustError> {
    let bytes = std::fs::read(path.as_ref())?;
    read_workbook(&bytes).map_err(|e| match e {
        TustError::MalformedDocument(msg) => {
            TustError::malformed(format!("{}: {msg}", path.as_ref().display()))
        }
        other => other,
    })
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Vec<u8>, TustError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => {
            return Err(TustError::malformed(format!("missing part {name}")));
        }
        Err(e) => return Err(TustError::malformed(format!("cannot open part {name}: {e}"))),
    };
    let too_large =
        || TustError::malformed(format!("part {name} exceeds {MAX_PART_SIZE} bytes uncompressed"));
    // The declared size comes from the archive and is not trusted for allocation.
    if file.size() > MAX_PART_SIZE {
        return Err(too_large());
    }
    let mut buf = Vec::new();
    file.by_ref()
        .take(MAX_PART_SIZE + 1)
        .read_to_end(&mut buf)
        .map_err(|e| TustError::malformed(format!("cannot read part {name}: {e}")))?;
    if buf.len() as u64 > MAX_PART_SIZE {
        return Err(too_large());
    }
    Ok(buf)
}

fn xml_err(part: &str, e: impl Display) -> TustError {
    TustError::malformed(format!("{part}: XML parse error: {e}"))
}

/// quick-xml does not report elements left open at end of input.
fn check_closed(part: &str, depth: usize) -> Result<(), TustError> {
    if depth > 0 {
        return Err(TustError::malformed(format!(
            "{part}: unexpected end of document, {depth} element(s) still open"
        )));
    }
    Ok(())
}

/// Decode the shared-string table: one entry per `si`, with every nested
/// `t` run concatenated.
pub(crate) fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, TustError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"si" => {
                        current.clear();
                        in_si = true;
                    }
                    b"t" if in_si => in_t = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Text(e)) if in_t => {
                let text = e.unescape().map_err(|e| xml_err(SHARED_STRINGS_PART, e))?;
                current.push_str(&text);
            }
            Ok(Event::CData(e)) if in_t => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"t" => in_t = false,
                    b"si" => {
                        strings.push(std::mem::take(&mut current));
                        in_si = false;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => {
                check_closed(SHARED_STRINGS_PART, depth)?;
                break;
            }
            Err(e) => return Err(xml_err(SHARED_STRINGS_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Cell being assembled while its children are read.
#[derive(Default)]
struct PendingCell {
    reference: Option<CellRef>,
    cell_type: Option<String>,
    value: Option<String>,
    inline: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum TextTarget {
    None,
    Value,
    Inline,
}

pub(crate) fn parse_sheet(xml: &[u8], shared: &[String]) -> Result<RawCellTable, TustError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut table = RawCellTable::new();
    let mut cell: Option<PendingCell> = None;
    let mut target = TextTarget::None;
    let mut in_inline = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"c" => cell = Some(start_cell(&e)?),
                    b"v" if cell.is_some() => {
                        target = TextTarget::Value;
                        if let Some(c) = cell.as_mut() {
                            c.value.get_or_insert_with(String::new);
                        }
                    }
                    b"is" if cell.is_some() => in_inline = true,
                    b"t" if in_inline => {
                        target = TextTarget::Inline;
                        if let Some(c) = cell.as_mut() {
                            c.inline.get_or_insert_with(String::new);
                        }
                    }
                    _ => {}
                }
            }
            // A self-closing cell carries no value.
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"c" => {
                start_cell(&e)?;
            }
            Ok(Event::Text(e)) if target != TextTarget::None => {
                let text = e.unescape().map_err(|e| xml_err(FIRST_SHEET_PART, e))?;
                push_text(cell.as_mut(), target, &text);
            }
            Ok(Event::CData(e)) if target != TextTarget::None => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                push_text(cell.as_mut(), target, &text);
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"v" | b"t" => target = TextTarget::None,
                    b"is" => in_inline = false,
                    b"c" => {
                        if let Some(done) = cell.take() {
                            finish_cell(done, shared, &mut table)?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => {
                check_closed(FIRST_SHEET_PART, depth)?;
                break;
            }
            Err(e) => return Err(xml_err(FIRST_SHEET_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(table)
}

fn start_cell(e: &BytesStart<'_>) -> Result<PendingCell, TustError> {
    let mut pending = PendingCell::default();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| xml_err(FIRST_SHEET_PART, e))?;
        let value = attr
            .unescape_value()
            .map_err(|e| xml_err(FIRST_SHEET_PART, e))?;
        match attr.key.local_name().as_ref() {
            b"r" => pending.reference = Some(CellRef::parse(&value)?),
            b"t" => pending.cell_type = Some(value.into_owned()),
            _ => {}
        }
    }
    if pending.reference.is_none() {
        return Err(TustError::malformed(format!(
            "{FIRST_SHEET_PART}: cell without a reference"
        )));
    }
    Ok(pending)
}

fn push_text(cell: Option<&mut PendingCell>, target: TextTarget, text: &str) {
    let Some(cell) = cell else { return };
    let slot = match target {
        TextTarget::Value => &mut cell.value,
        TextTarget::Inline => &mut cell.inline,
        TextTarget::None => return,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

fn finish_cell(
    cell: PendingCell,
    shared: &[String],
    table: &mut RawCellTable,
) -> Result<(), TustError> {
    let Some(reference) = cell.reference else {
        return Ok(());
    };
    let value = match cell.cell_type.as_deref() {
        Some("s") => match cell.value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => {
                let index: usize = raw.parse().map_err(|_| {
                    TustError::malformed(format!(
                        "cell {reference}: invalid shared string index '{raw}'"
                    ))
                })?;
                let text = shared.get(index).ok_or_else(|| {
                    TustError::malformed(format!(
                        "cell {reference}: shared string index {index} out of range ({} strings)",
                        shared.len()
                    ))
                })?;
                Some(text.clone())
            }
            None => None,
        },
        Some("inlineStr") => cell.inline,
        _ => cell.value.filter(|v| !v.is_empty()),
    };
    if let Some(value) = value {
        table.insert(reference.row, reference.column, value);
    }
    Ok(())
}
