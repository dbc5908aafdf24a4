use async_trait::async_trait;
use domain::{Invoice, InvoiceStatus, NewInvoice};

use crate::{InvoiceId, Result, StoreError};

/// Core trait for invoice persistence.
///
/// All implementations must be thread-safe (Send + Sync): the print saga may
/// run on any request-handling worker, so every guarantee here has to hold
/// across tasks and processes, not just within one.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persists a new invoice in status `Open` and assigns its sequence number.
    ///
    /// Numbers are unique and strictly increasing in insertion order. Line
    /// items keep the order they have in `invoice.items`.
    async fn insert(&self, invoice: NewInvoice) -> Result<Invoice>;

    /// Loads an invoice with its line items.
    ///
    /// Returns None if the invoice doesn't exist.
    async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>>;

    /// Lists invoices ordered by number, optionally restricted to one status.
    async fn list(&self, status: Option<InvoiceStatus>) -> Result<Vec<Invoice>>;

    /// Atomically moves an invoice from `expected` to `next`.
    ///
    /// This is a compare-and-swap on the status column: it succeeds only if
    /// the stored status equals `expected` at the moment of the write, and
    /// fails with `StatusConflict` otherwise. `expected → next` must be an
    /// edge of the invoice state machine.
    ///
    /// Returns the invoice as it is after the write.
    async fn transition_status(
        &self,
        id: InvoiceId,
        expected: InvoiceStatus,
        next: InvoiceStatus,
    ) -> Result<Invoice>;
}

/// Extension trait providing convenience methods for invoice stores.
#[async_trait]
pub trait InvoiceStoreExt: InvoiceStore {
    /// Loads an invoice, failing with `NotFound` if it doesn't exist.
    async fn get_existing(&self, id: InvoiceId) -> Result<Invoice> {
        self.get(id).await?.ok_or(StoreError::NotFound(id))
    }
}

// Blanket implementation for all InvoiceStore implementations
impl<T: InvoiceStore + ?Sized> InvoiceStoreExt for T {}

/// Rejects transitions that are not edges of the state machine before any
/// storage is touched.
pub(crate) fn validate_transition(expected: InvoiceStatus, next: InvoiceStatus) -> Result<()> {
    if !expected.can_transition_to(next) {
        return Err(domain::InvoiceError::InvalidTransition {
            from: expected,
            to: next,
        }
        .into());
    }
    Ok(())
}

#[async_trait]
impl<T: InvoiceStore + ?Sized> InvoiceStore for std::sync::Arc<T> {
    async fn insert(&self, invoice: NewInvoice) -> Result<Invoice> {
        (**self).insert(invoice).await
    }

    async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        (**self).get(id).await
    }

    async fn list(&self, status: Option<InvoiceStatus>) -> Result<Vec<Invoice>> {
        (**self).list(status).await
    }

    async fn transition_status(
        &self,
        id: InvoiceId,
        expected: InvoiceStatus,
        next: InvoiceStatus,
    ) -> Result<Invoice> {
        (**self).transition_status(id, expected, next).await
    }
}
