use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::period::BillingPeriod;

/// Header of an AVD (aviso de débito) spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitNoteHeader {
    /// Debit note number (cell D1).
    pub debit_note_number: String,
    /// Company code of the paying company (cell A2).
    pub company_code: String,
    /// Company name (cell B2).
    pub company_name: String,
    /// Billing period, decoded from "Outubro/2025" style text (cell D2).
    pub billing_period: BillingPeriod,
    /// Date the note was made available (Excel serial in cell D3).
    pub disbursement_date: NaiveDateTime,
    /// Due date of each installment (cells D5, E5, F5).
    pub installment_1_due: NaiveDate,
    pub installment_2_due: NaiveDate,
    pub installment_3_due: NaiveDate,
    /// Monthly charge (cell G1).
    pub monthly_charge: Option<Decimal>,
    /// PV/SPB amount (cell G2).
    pub pv_spb_amount: Option<Decimal>,
    /// Total without PIS/COFINS (cell G3).
    pub total_without_pis_cofins: Option<Decimal>,
}

/// One transmitter line of a debit note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitNoteItem {
    /// ONS code of the transmission company (column A).
    pub ons_code: String,
    pub transmitter_name: Option<String>,
    pub cnpj: Option<String>,
    pub installment_1_amount: Option<Decimal>,
    pub installment_2_amount: Option<Decimal>,
    pub installment_3_amount: Option<Decimal>,
    /// PIS/COFINS amount (column G).
    pub pis_cofins_amount: Option<Decimal>,
    /// Declared total (column H).
    pub total_amount: Option<Decimal>,
}

impl DebitNoteItem {
    /// Sum of the three installments, unset installments counting as zero.
    pub fn installments_sum(&self) -> Decimal {
        [
            self.installment_1_amount,
            self.installment_2_amount,
            self.installment_3_amount,
        ]
        .into_iter()
        .flatten()
        .sum()
    }
}

/// An NFe invoice issued by a transmitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// ONS code of the transmitter the invoice was retrieved for.
    pub ons_code: String,
    pub billing_period: BillingPeriod,
    pub issuer_cnpj: String,
    pub issuer_name: String,
    pub recipient_cnpj: String,
    pub recipient_name: String,
    /// `ide/nNF`.
    pub invoice_number: String,
    /// `ide/serie`.
    pub series: String,
    /// Fiscal access key, the `Id` attribute of `infNFe`.
    pub invoice_key: String,
    /// `cobr/fat/nFat`.
    pub bill_number: Option<String>,
    /// `total/ICMSTot/vNF`, zero when absent.
    pub total_amount: Decimal,
    pub issue_datetime: DateTime<FixedOffset>,
    /// `cobr/dup/dVenc`.
    pub due_date: Option<NaiveDate>,
    /// `cobr/dup/nDup`.
    pub installment_number: Option<String>,
    /// `cobr/dup/vDup`.
    pub installment_amount: Option<Decimal>,
    /// File the invoice was decoded from, when read from disk.
    pub source_file: Option<PathBuf>,
}

/// A registered transmission company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transmitter {
    pub ons_code: String,
    pub cnpj: String,
    pub name: String,
}

/// A debit note as held by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDebitNote {
    /// Repository-assigned identifier.
    pub id: i64,
    /// ONS code of the first item at import time.
    pub ons_code: Option<String>,
    pub header: DebitNoteHeader,
}

/// Persisted row for one reconciled invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub included_at: DateTime<Utc>,
    pub debit_note_id: i64,
    pub debit_note_number: String,
    pub issuer_cnpj: String,
    pub issuer_name: String,
    pub recipient_cnpj: String,
    pub recipient_name: String,
    pub invoice_number: String,
    pub bill_number: Option<String>,
    pub issue_datetime: DateTime<FixedOffset>,
    pub due_date: Option<NaiveDate>,
    pub total_amount: Decimal,
    pub invoice_key: String,
}

impl InvoiceRecord {
    /// Map an invoice onto the row stored against `note`.
    pub fn new(note: &StoredDebitNote, invoice: &Invoice, included_at: DateTime<Utc>) -> Self {
        Self {
            included_at,
            debit_note_id: note.id,
            debit_note_number: note.header.debit_note_number.clone(),
            issuer_cnpj: invoice.issuer_cnpj.clone(),
            issuer_name: invoice.issuer_name.clone(),
            recipient_cnpj: invoice.recipient_cnpj.clone(),
            recipient_name: invoice.recipient_name.clone(),
            invoice_number: invoice.invoice_number.clone(),
            bill_number: invoice.bill_number.clone(),
            issue_datetime: invoice.issue_datetime,
            due_date: invoice.due_date,
            total_amount: invoice.total_amount,
            invoice_key: invoice.invoice_key.clone(),
        }
    }
}
