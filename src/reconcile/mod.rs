//! Reconciliation of NFe invoices against AVD debit notes.
//!
//! [`reconcile`] compares each invoice total with the sum of the three
//! installments the debit note assigns to the issuing transmitter, stores one
//! [`InvoiceRecord`](crate::core::InvoiceRecord) per invoice and returns a
//! [`ReconciliationResult`] that serializes to JSON:
//!
//! ```json
//! {
//!   "status": "ok",
//!   "debit_note_number": "1234",
//!   "transmitter_ons_code": "T001",
//!   "validations": [
//!     { "invoice_number": "9876", "amount": "150.01", "ons_code": "T001",
//!       "period": "2025-10-01",
//!       "divergence": "invoice total (150.01) differs from installment sum (150.00)" }
//!   ]
//! }
//! ```

mod engine;
mod result;

pub use engine::reconcile;
pub use result::{Divergence, InvoiceValidation, ReconciliationResult, ReconciliationStatus};
