//! NFe (Nota Fiscal eletrônica) invoice decoding.
//!
//! Reads the `infNFe` block of an NFe or `nfeProc` document in the national
//! namespace. Only the fields needed for reconciliation are extracted:
//!
//! | Path below `infNFe` | Field |
//! |---------------------|-------|
//! | `@Id` | `invoice_key` |
//! | `ide/nNF`, `ide/serie`, `ide/dhEmi` | number, series, issue timestamp |
//! | `emit/CNPJ`, `emit/xNome` | issuer |
//! | `dest/CNPJ`, `dest/xNome` | recipient |
//! | `total/ICMSTot/vNF` | total amount |
//! | `cobr/fat/nFat` | bill number |
//! | `cobr/dup/{nDup,vDup,dVenc}` | first installment |
//!
//! # Example
//!
//! ```no_run
//! use tust::core::{BillingPeriod, SystemClock};
//! use tust::nfe;
//!
//! let period = BillingPeriod::new(2025, 10).unwrap();
//! let invoices =
//!     nfe::parse_nfe_directory("data/vsb/2025.10/T001", "T001", period, &SystemClock).unwrap();
//! ```

mod parse;
mod retrieval;

pub use parse::{parse_amount, parse_issue_datetime, parse_nfe, parse_nfe_directory, parse_nfe_file};
pub use retrieval::RetrievedBatch;

/// National NFe namespace.
pub const NFE_NS: &str = "http://www.portalfiscal.inf.br/nfe";
