use std::path::Path;

use tracing::{debug, trace};

use super::convert::*;
use crate::core::{DebitNoteHeader, DebitNoteItem, TustError};
use crate::xlsx::{self, RawCellTable};

/// First worksheet row holding transmitter items.
pub const FIRST_ITEM_ROW: u32 = 6;

/// Interpret a decoded AVD worksheet.
///
/// Header cells are required (except the `G` column amounts). Item rows start
/// at [`FIRST_ITEM_ROW`]; rows with an empty column `A` are separators and
/// are skipped.
pub fn parse_avd(table: &RawCellTable) -> Result<(DebitNoteHeader, Vec<DebitNoteItem>), TustError> {
    let header = parse_header(table)?;
    let items = parse_items(table)?;
    debug!(
        debit_note = %header.debit_note_number,
        company = %header.company_code,
        period = %header.billing_period,
        items = items.len(),
        "parsed AVD"
    );
    Ok((header, items))
}

/// Read and interpret an AVD spreadsheet file.
pub fn parse_avd_file(
    path: impl AsRef<Path>,
) -> Result<(DebitNoteHeader, Vec<DebitNoteItem>), TustError> {
    let path = path.as_ref();
    let table = xlsx::read_workbook_file(path)?;
    parse_avd(&table).map_err(|e| match e {
        TustError::MalformedDocument(msg) => {
            TustError::malformed(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

fn parse_header(table: &RawCellTable) -> Result<DebitNoteHeader, TustError> {
    let period_text = required_text(table, 2, "D")?;
    let billing_period = parse_period(&period_text).map_err(|e| at_cell("D2", e))?;

    let serial = required_text(table, 3, "D")?;
    let disbursement_date = excel_serial_to_datetime(&serial).map_err(|e| at_cell("D3", e))?;

    let due = |column: &str| -> Result<_, TustError> {
        let text = required_text(table, 5, column)?;
        parse_due_date(&text).map_err(|e| at_cell(&format!("{column}5"), e))
    };

    Ok(DebitNoteHeader {
        debit_note_number: required_text(table, 1, "D")?,
        company_code: required_text(table, 2, "A")?,
        company_name: required_text(table, 2, "B")?,
        billing_period,
        disbursement_date,
        installment_1_due: due("D")?,
        installment_2_due: due("E")?,
        installment_3_due: due("F")?,
        monthly_charge: optional_decimal(table, 1, "G")?,
        pv_spb_amount: optional_decimal(table, 2, "G")?,
        total_without_pis_cofins: optional_decimal(table, 3, "G")?,
    })
}

fn parse_items(table: &RawCellTable) -> Result<Vec<DebitNoteItem>, TustError> {
    let mut items = Vec::new();
    for (row, _) in table.rows().filter(|(row, _)| *row >= FIRST_ITEM_ROW) {
        let Some(ons_code) = optional_text(table, row, "A") else {
            trace!(row, "skipping separator row");
            continue;
        };
        items.push(DebitNoteItem {
            ons_code,
            transmitter_name: optional_text(table, row, "B"),
            cnpj: optional_text(table, row, "C"),
            installment_1_amount: optional_decimal(table, row, "D")?,
            installment_2_amount: optional_decimal(table, row, "E")?,
            installment_3_amount: optional_decimal(table, row, "F")?,
            pis_cofins_amount: optional_decimal(table, row, "G")?,
            total_amount: optional_decimal(table, row, "H")?,
        });
    }
    Ok(items)
}

fn at_cell(cell: &str, e: TustError) -> TustError {
    match e {
        TustError::MalformedDocument(msg) => TustError::malformed(format!("cell {cell}: {msg}")),
        other => other,
    }
}
