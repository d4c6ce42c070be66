use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::core::{BillingPeriod, TustError};

/// Outcome status of a reconciliation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationStatus {
    /// Invoices were checked and stored.
    #[serde(rename = "ok")]
    Ok,
    /// The batch was empty; nothing was checked or stored.
    #[serde(rename = "sem_notas")]
    NoInvoices,
}

/// Why an invoice does not match its debit note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Divergence {
    /// The debit note has no item for the invoicing transmitter.
    ItemNotFound,
    /// Invoice total differs from the sum of the item's installments.
    AmountMismatch {
        invoice_total: Decimal,
        installments_sum: Decimal,
    },
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemNotFound => write!(f, "transmitter item not found in debit note"),
            Self::AmountMismatch {
                invoice_total,
                installments_sum,
            } => write!(
                f,
                "invoice total ({invoice_total}) differs from installment sum ({installments_sum})"
            ),
        }
    }
}

impl Serialize for Divergence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Verdict for one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceValidation {
    pub invoice_number: String,
    pub amount: Decimal,
    /// ONS code of the resolved transmitter.
    pub ons_code: String,
    pub period: BillingPeriod,
    /// `None` when the invoice matches.
    pub divergence: Option<Divergence>,
}

impl InvoiceValidation {
    pub fn is_divergent(&self) -> bool {
        self.divergence.is_some()
    }
}

/// Result of reconciling one invoice batch against one debit note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub status: ReconciliationStatus,
    pub debit_note_number: String,
    /// Absent when the batch was empty.
    pub transmitter_ons_code: Option<String>,
    /// One entry per input invoice, in input order.
    pub validations: Vec<InvoiceValidation>,
}

impl ReconciliationResult {
    /// Number of invoices carrying a divergence.
    pub fn divergent_count(&self) -> usize {
        self.validations.iter().filter(|v| v.is_divergent()).count()
    }

    /// JSON rendering for the API collaborator.
    pub fn to_json(&self) -> Result<String, TustError> {
        serde_json::to_string_pretty(self).map_err(json_err)
    }
}

fn json_err(e: serde_json::Error) -> TustError {
    TustError::Serialization(format!("JSON rendering failed: {e}"))
}
