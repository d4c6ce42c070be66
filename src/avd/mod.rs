//! AVD (aviso de débito) debit-note spreadsheets.
//!
//! The AVD template is a single worksheet with a fixed layout:
//!
//! | Cell(s) | Content |
//! |---------|---------|
//! | D1 | Debit note number |
//! | A2, B2, D2 | Company code, company name, period (`Outubro/2025`) |
//! | D3 | Disbursement date (Excel serial) |
//! | G1, G2, G3 | Monthly charge, PV/SPB amount, total without PIS/COFINS |
//! | D5, E5, F5 | Installment due dates (`1a. Parcela dia 15/11/2025`) |
//! | A–H from row 6 | ONS code, name, CNPJ, installments 1–3, PIS/COFINS, total |
//!
//! # Example
//!
//! ```no_run
//! use tust::avd;
//! use tust::core::InMemoryRepository;
//!
//! let mut repo = InMemoryRepository::new();
//! let (header, items) = avd::parse_avd_file("avd.xlsx").unwrap();
//! let outcome = avd::import_debit_note(&mut repo, &header, &items, false).unwrap();
//! assert!(outcome.created);
//! ```

mod convert;
mod import;
mod parse;

pub use convert::{
    excel_epoch, excel_serial_to_datetime, month_from_name, normalize_month_name, parse_decimal,
    parse_due_date, parse_period,
};
pub use import::{
    BatchEntry, ImportConfig, ImportConfigBuilder, ImportOutcome, collect_spreadsheets,
    import_avd_batch, import_avd_file, import_debit_note,
};
pub use parse::{FIRST_ITEM_ROW, parse_avd, parse_avd_file};
