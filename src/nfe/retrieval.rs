use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parse::{is_xml, parse_nfe_file};
use crate::core::{BillingPeriod, Clock, Invoice, TustError};

/// What the retrieval robot hands over after downloading and unpacking a
/// transmitter's invoice archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedBatch {
    /// Transmitter the archive was requested for.
    pub ons_code: String,
    pub period: BillingPeriod,
    /// Directory the archive was unpacked into.
    pub destination: PathBuf,
    /// Every file extracted from the archive.
    pub files: Vec<PathBuf>,
}

impl RetrievedBatch {
    /// Decode the XML files of the batch, in the order they were extracted.
    /// Non-XML files (DANFE PDFs, boletos) are ignored.
    pub fn parse_invoices(&self, clock: &dyn Clock) -> Result<Vec<Invoice>, TustError> {
        let mut invoices = Vec::new();
        for file in self.files.iter().filter(|f| is_xml(f)) {
            invoices.push(parse_nfe_file(file, &self.ons_code, self.period, clock)?);
        }
        debug!(
            ons_code = %self.ons_code,
            period = %self.period,
            files = self.files.len(),
            invoices = invoices.len(),
            "decoded retrieved batch"
        );
        Ok(invoices)
    }
}
