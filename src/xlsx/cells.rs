use std::collections::BTreeMap;
use std::fmt;

use crate::core::TustError;

/// A cell coordinate such as `D12`, split into column letters and row number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub column: String,
    pub row: u32,
}

impl CellRef {
    /// Split a reference like `AB12` into `("AB", 12)`.
    ///
    /// Column letters are upper-cased; `$` anchors are ignored.
    pub fn parse(reference: &str) -> Result<Self, TustError> {
        let cleaned: String = reference.chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(cleaned.len());
        let (letters, digits) = cleaned.split_at(split);
        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TustError::malformed(format!("invalid cell reference '{reference}'")));
        }
        let row = digits
            .parse::<u32>()
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| TustError::malformed(format!("invalid cell reference '{reference}'")))?;
        Ok(Self {
            column: letters.to_ascii_uppercase(),
            row,
        })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

/// Cells of one worksheet row, keyed by column letters.
pub type Row = BTreeMap<String, String>;

/// Raw text of every populated cell of a worksheet.
///
/// Values are kept verbatim; whether a cell holds a label, a number or a
/// date serial is decided by the consumer, per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCellTable {
    rows: BTreeMap<u32, Row>,
}

impl RawCellTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell. A later write to the same coordinate replaces the earlier one.
    pub fn insert(&mut self, row: u32, column: impl Into<String>, value: impl Into<String>) {
        self.rows
            .entry(row)
            .or_default()
            .insert(column.into(), value.into());
    }

    /// Raw text at `(row, column)`.
    pub fn get(&self, row: u32, column: &str) -> Option<&str> {
        self.rows
            .get(&row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(&row)
    }

    /// Populated rows in ascending row order.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(n, r)| (*n, r))
    }

    /// Number of populated rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
