use domain::{InvoiceError, InvoiceStatus};
use thiserror::Error;

use crate::InvoiceId;

/// Errors that can occur when interacting with the invoice store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No invoice exists with the given id.
    #[error("Invoice not found: {0}")]
    NotFound(InvoiceId),

    /// A status compare-and-swap lost: the stored status was not the expected one.
    #[error("Status conflict for invoice {invoice_id}: expected {expected}, found {actual}")]
    StatusConflict {
        invoice_id: InvoiceId,
        expected: InvoiceStatus,
        actual: InvoiceStatus,
    },

    /// The requested change violates the invoice state machine.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// A stored row could not be mapped back into the domain.
    #[error("Corrupt invoice row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for invoice store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
