//! Column-aware conversions from raw cell text.
//!
//! The worksheet stores every value as text; each function here interprets
//! one kind of cell and reports failures against the cell coordinate.

use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::core::{BillingPeriod, TustError};
use crate::xlsx::RawCellTable;

/// Day zero of the Excel 1900 date system (with the 1900 leap-year bug folded in).
pub fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

const PT_BR_MONTHS: [(&str, u32); 12] = [
    ("janeiro", 1),
    ("fevereiro", 2),
    ("marco", 3),
    ("abril", 4),
    ("maio", 5),
    ("junho", 6),
    ("julho", 7),
    ("agosto", 8),
    ("setembro", 9),
    ("outubro", 10),
    ("novembro", 11),
    ("dezembro", 12),
];

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Required cell text, trimmed. Empty counts as missing.
pub(crate) fn required_text(
    table: &RawCellTable,
    row: u32,
    column: &str,
) -> Result<String, TustError> {
    optional_text(table, row, column)
        .ok_or_else(|| TustError::malformed(format!("required cell {column}{row} is missing")))
}

/// Optional cell text, trimmed. Empty counts as missing.
pub(crate) fn optional_text(table: &RawCellTable, row: u32, column: &str) -> Option<String> {
    table
        .get(row, column)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Optional decimal cell.
pub(crate) fn optional_decimal(
    table: &RawCellTable,
    row: u32,
    column: &str,
) -> Result<Option<Decimal>, TustError> {
    optional_text(table, row, column)
        .map(|text| {
            parse_decimal(&text)
                .map_err(|e| TustError::malformed(format!("cell {column}{row}: {e}")))
        })
        .transpose()
}

/// Parse decimal text as stored by the spreadsheet (`1234.56`, `1.5E-2`).
pub fn parse_decimal(text: &str) -> Result<Decimal, TustError> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| TustError::malformed(format!("invalid decimal '{text}': {e}")))
}

/// Convert an Excel serial (fractional days since 1899-12-30) to a timestamp.
///
/// The serial is handled as a decimal so that `45596.5` lands exactly on noon.
pub fn excel_serial_to_datetime(serial: &str) -> Result<NaiveDateTime, TustError> {
    let value = parse_decimal(serial)
        .map_err(|_| TustError::malformed(format!("invalid Excel serial '{}'", serial.trim())))?;
    let days = value.trunc();
    let fraction = value - days;
    let out_of_range =
        || TustError::malformed(format!("Excel serial '{}' out of range", serial.trim()));

    let days = days.to_i64().ok_or_else(out_of_range)?;
    let micros = (fraction * Decimal::from(MICROS_PER_DAY))
        .round()
        .to_i64()
        .ok_or_else(out_of_range)?;

    let offset = Duration::try_days(days)
        .and_then(|d| d.checked_add(&Duration::microseconds(micros)))
        .ok_or_else(out_of_range)?;
    excel_epoch()
        .checked_add_signed(offset)
        .ok_or_else(out_of_range)
}

/// Lower-case and strip diacritics: `"Março "` → `"marco"`.
pub fn normalize_month_name(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Month number for a Portuguese month name, accents and case ignored.
pub fn month_from_name(name: &str) -> Option<u32> {
    let normalized = normalize_month_name(name);
    PT_BR_MONTHS
        .iter()
        .find(|(month, _)| *month == normalized)
        .map(|(_, number)| *number)
}

/// Parse `"Outubro/2025"` into the billing period starting 2025-10-01.
pub fn parse_period(text: &str) -> Result<BillingPeriod, TustError> {
    let invalid = |why: &str| TustError::malformed(format!("invalid period '{text}': {why}"));
    let mut parts = text.split('/');
    let (Some(month), Some(year), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid("expected Month/Year"));
    };
    let month = month_from_name(month).ok_or_else(|| invalid("unknown month name"))?;
    let year: i32 = year.trim().parse().map_err(|_| invalid("invalid year"))?;
    BillingPeriod::new(year, month).ok_or_else(|| invalid("out of range"))
}

/// Parse `"1a. Parcela dia 15/11/2025"`: the date follows the token `dia`.
pub fn parse_due_date(text: &str) -> Result<NaiveDate, TustError> {
    let (_, date_part) = text
        .split_once("dia")
        .ok_or_else(|| TustError::malformed(format!("could not parse due date text '{text}'")))?;
    NaiveDate::parse_from_str(date_part.trim(), "%d/%m/%Y").map_err(|e| {
        TustError::malformed(format!("could not parse due date text '{text}': {e}"))
    })
}
