//! Minimal xlsx reader.
//!
//! Reads exactly two parts of a spreadsheet container, the shared-string
//! table and the first worksheet, and produces a [`RawCellTable`] of raw
//! text values. Styles, formulas, additional sheets and workbook metadata are
//! never looked at.
//!
//! # Example
//!
//! ```no_run
//! let bytes = std::fs::read("avd.xlsx").unwrap();
//! let table = tust::xlsx::read_workbook(&bytes).unwrap();
//! assert_eq!(table.get(1, "D"), Some("1234"));
//! ```

mod cells;
mod reader;

pub use cells::{CellRef, RawCellTable, Row};
pub use reader::{read_workbook, read_workbook_file};

/// Zip entry holding the shared-string table.
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Zip entry holding the first worksheet.
pub const FIRST_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Largest uncompressed part accepted, declared or actual.
pub const MAX_PART_SIZE: u64 = 64 * 1024 * 1024;

/// SpreadsheetML main namespace.
pub const SPREADSHEETML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
