use thiserror::Error;

/// Errors that can occur while decoding documents or reconciling invoices.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TustError {
    /// Structural defect in a single input document (missing part, element or
    /// cell, unreadable zip or XML, undecodable value).
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// Batch-level precondition violated (no debit note for the company and
    /// period, issuer not registered as a transmitter).
    #[error("reconciliation error: {0}")]
    Reconciliation(String),

    /// Failure reported by the persistence collaborator.
    #[error("repository error: {0}")]
    Repository(String),

    /// A result could not be rendered (JSON output).
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem error while reading a source document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TustError {
    /// Shorthand for a [`TustError::MalformedDocument`] error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument(message.into())
    }

    /// Returns true for errors caused by a defective input document.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedDocument(_))
    }
}
