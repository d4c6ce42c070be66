//! # tust
//!
//! Ingestion and reconciliation of Brazilian transmission-tariff (TUST)
//! documents: AVD debit-note spreadsheets published by the ONS and the NFe
//! invoices transmission companies issue against them.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Persistence goes through the [`core::TustRepository`] trait; an in-memory
//! implementation ships with the crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use tust::core::*;
//! use tust::reconcile::reconcile;
//!
//! let mut repo = InMemoryRepository::new();
//! let clock = FixedClock(Utc.with_ymd_and_hms(2025, 11, 3, 9, 0, 0).unwrap());
//! let period = BillingPeriod::parse_competence("2025.10").unwrap();
//!
//! // No debit note has been imported yet.
//! assert!(reconcile(&mut repo, &clock, "EMP01", period, &[]).is_err());
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Record types, errors, billing periods, clock, repository trait |
//! | `xlsx` | Minimal xlsx reader (shared strings + first worksheet) |
//! | `avd` (default) | AVD debit-note parsing and import |
//! | `nfe` (default) | NFe invoice XML decoding |
//! | `reconcile` (default) | Invoice vs. debit-note reconciliation, JSON results |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xlsx")]
pub mod xlsx;

#[cfg(feature = "avd")]
pub mod avd;

#[cfg(feature = "nfe")]
pub mod nfe;

#[cfg(feature = "reconcile")]
pub mod reconcile;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
