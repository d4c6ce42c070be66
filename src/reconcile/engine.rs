//! Invoice batch reconciliation against a stored debit note.

use tracing::{debug, info, warn};

use super::result::{Divergence, InvoiceValidation, ReconciliationResult, ReconciliationStatus};
use crate::core::{BillingPeriod, Clock, Invoice, InvoiceRecord, TustError, TustRepository};

/// Check a batch of invoices from one transmitter against the debit note of
/// `company_code` for `period`, then store one record per invoice.
///
/// The transmitter is resolved from the issuer CNPJ of the first invoice.
/// Every invoice is compared with the same debit-note item: its total must
/// equal the sum of the item's three installments exactly. When the note has
/// no item for the transmitter every invoice is flagged
/// [`Divergence::ItemNotFound`].
///
/// Records are stored for divergent invoices as well. Validations follow the
/// input order.
///
/// # Errors
///
/// [`TustError::Reconciliation`] when no debit note exists for the company and
/// period, or when the issuer CNPJ is not a registered transmitter. Nothing is
/// stored in either case.
pub fn reconcile<R: TustRepository + ?Sized>(
    repo: &mut R,
    clock: &dyn Clock,
    company_code: &str,
    period: BillingPeriod,
    invoices: &[Invoice],
) -> Result<ReconciliationResult, TustError> {
    let note = repo.find_debit_note(company_code, period)?.ok_or_else(|| {
        TustError::Reconciliation(format!(
            "no debit note for company {company_code} and period {period}"
        ))
    })?;

    let Some(first) = invoices.first() else {
        info!(
            debit_note = %note.header.debit_note_number,
            company_code,
            %period,
            "no invoices to reconcile"
        );
        return Ok(ReconciliationResult {
            status: ReconciliationStatus::NoInvoices,
            debit_note_number: note.header.debit_note_number,
            transmitter_ons_code: None,
            validations: Vec::new(),
        });
    };

    let transmitter = repo
        .find_transmitter_by_cnpj(&first.issuer_cnpj)?
        .ok_or_else(|| {
            TustError::Reconciliation(format!(
                "transmitter with CNPJ {} is not registered",
                first.issuer_cnpj
            ))
        })?;

    let item = repo.find_debit_note_item(note.id, &transmitter.ons_code)?;
    if item.is_none() {
        warn!(
            debit_note = %note.header.debit_note_number,
            ons_code = %transmitter.ons_code,
            "debit note has no item for transmitter"
        );
    }
    let expected = item.as_ref().map(|i| i.installments_sum());

    let validations: Vec<InvoiceValidation> = invoices
        .iter()
        .map(|invoice| {
            let divergence = match expected {
                None => Some(Divergence::ItemNotFound),
                Some(sum) if sum != invoice.total_amount => Some(Divergence::AmountMismatch {
                    invoice_total: invoice.total_amount,
                    installments_sum: sum,
                }),
                Some(_) => None,
            };
            if let Some(d) = &divergence {
                debug!(invoice = %invoice.invoice_number, divergence = %d, "invoice diverges");
            }
            InvoiceValidation {
                invoice_number: invoice.invoice_number.clone(),
                amount: invoice.total_amount,
                ons_code: transmitter.ons_code.clone(),
                period,
                divergence,
            }
        })
        .collect();

    let included_at = clock.now();
    let records: Vec<InvoiceRecord> = invoices
        .iter()
        .map(|invoice| InvoiceRecord::new(&note, invoice, included_at))
        .collect();
    repo.insert_invoice_records(&records)?;

    let result = ReconciliationResult {
        status: ReconciliationStatus::Ok,
        debit_note_number: note.header.debit_note_number,
        transmitter_ons_code: Some(transmitter.ons_code),
        validations,
    };
    info!(
        debit_note = %result.debit_note_number,
        invoices = invoices.len(),
        divergent = result.divergent_count(),
        "reconciliation finished"
    );
    Ok(result)
}
