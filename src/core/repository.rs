use super::error::TustError;
use super::period::BillingPeriod;
use super::types::*;

/// Persistence collaborator for debit notes, transmitters and invoice rows.
///
/// Implementations own transactions and isolation. Lookups return `Ok(None)`
/// for missing rows; `Err` is reserved for storage failures.
pub trait TustRepository {
    /// Debit note for a company and billing period.
    fn find_debit_note(
        &self,
        company_code: &str,
        period: BillingPeriod,
    ) -> Result<Option<StoredDebitNote>, TustError>;

    /// Debit note by its number.
    fn find_debit_note_by_number(&self, number: &str) -> Result<Option<StoredDebitNote>, TustError>;

    /// Transmitter registered under a CNPJ.
    fn find_transmitter_by_cnpj(&self, cnpj: &str) -> Result<Option<Transmitter>, TustError>;

    /// Item of a debit note for a transmitter ONS code.
    fn find_debit_note_item(
        &self,
        note_id: i64,
        ons_code: &str,
    ) -> Result<Option<DebitNoteItem>, TustError>;

    /// Store a note with its items, returning the new note id. Items are
    /// numbered from 1 in slice order.
    fn insert_debit_note(
        &mut self,
        note: &DebitNoteHeader,
        ons_code: Option<&str>,
        items: &[DebitNoteItem],
    ) -> Result<i64, TustError>;

    /// Delete a note and all of its items.
    fn delete_debit_note(&mut self, note_id: i64) -> Result<(), TustError>;

    /// Append invoice rows.
    fn insert_invoice_records(&mut self, records: &[InvoiceRecord]) -> Result<(), TustError>;
}

/// Repository kept in memory. Used for tests and offline runs.
///
/// Item lookups scan from the most recently stored row, so a duplicated
/// `(note, ons_code)` pair resolves to the last one inserted.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    next_id: i64,
    notes: Vec<StoredDebitNote>,
    items: Vec<(i64, DebitNoteItem)>,
    transmitters: Vec<Transmitter>,
    invoices: Vec<InvoiceRecord>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transmitter so that its CNPJ resolves.
    pub fn register_transmitter(&mut self, transmitter: Transmitter) {
        self.transmitters.push(transmitter);
    }

    pub fn notes(&self) -> &[StoredDebitNote] {
        &self.notes
    }

    /// Items stored for a note, in insertion order.
    pub fn items_of(&self, note_id: i64) -> Vec<&DebitNoteItem> {
        self.items
            .iter()
            .filter(|(id, _)| *id == note_id)
            .map(|(_, item)| item)
            .collect()
    }

    pub fn invoice_records(&self) -> &[InvoiceRecord] {
        &self.invoices
    }
}

impl TustRepository for InMemoryRepository {
    fn find_debit_note(
        &self,
        company_code: &str,
        period: BillingPeriod,
    ) -> Result<Option<StoredDebitNote>, TustError> {
        Ok(self
            .notes
            .iter()
            .find(|n| n.header.company_code == company_code && n.header.billing_period == period)
            .cloned())
    }

    fn find_debit_note_by_number(
        &self,
        number: &str,
    ) -> Result<Option<StoredDebitNote>, TustError> {
        Ok(self
            .notes
            .iter()
            .find(|n| n.header.debit_note_number == number)
            .cloned())
    }

    fn find_transmitter_by_cnpj(&self, cnpj: &str) -> Result<Option<Transmitter>, TustError> {
        Ok(self.transmitters.iter().find(|t| t.cnpj == cnpj).cloned())
    }

    fn find_debit_note_item(
        &self,
        note_id: i64,
        ons_code: &str,
    ) -> Result<Option<DebitNoteItem>, TustError> {
        Ok(self
            .items
            .iter()
            .rev()
            .find(|(id, item)| *id == note_id && item.ons_code == ons_code)
            .map(|(_, item)| item.clone()))
    }

    fn insert_debit_note(
        &mut self,
        note: &DebitNoteHeader,
        ons_code: Option<&str>,
        items: &[DebitNoteItem],
    ) -> Result<i64, TustError> {
        self.next_id += 1;
        let id = self.next_id;
        self.notes.push(StoredDebitNote {
            id,
            ons_code: ons_code.map(str::to_string),
            header: note.clone(),
        });
        self.items.extend(items.iter().cloned().map(|item| (id, item)));
        Ok(id)
    }

    fn delete_debit_note(&mut self, note_id: i64) -> Result<(), TustError> {
        self.items.retain(|(id, _)| *id != note_id);
        self.notes.retain(|n| n.id != note_id);
        Ok(())
    }

    fn insert_invoice_records(&mut self, records: &[InvoiceRecord]) -> Result<(), TustError> {
        self.invoices.extend_from_slice(records);
        Ok(())
    }
}
