//! Print saga coordinator.

use std::collections::HashSet;

use common::{InvoiceId, ProductId};
use domain::{Invoice, InvoiceStatus, LineItem};
use inventory::{InventoryClient, InventoryError};
use invoice_store::{InvoiceStore, InvoiceStoreExt};

use crate::error::{Result, SagaError};
use crate::printed::PrintedInvoice;

/// Drives an invoice through the print saga.
///
/// Printing locks the invoice by moving it `Open → Processing`, decrements
/// every line from the ledger in stored order, and finishes in `Closed`. If a
/// decrement fails, the lines already decremented are incremented back and
/// the invoice ends in `Cancelled`.
///
/// The persisted `Processing` status is the only lock. A crash mid-saga
/// leaves the invoice there; list invoices by status to find them.
pub struct PrintCoordinator<S, I>
where
    S: InvoiceStore,
    I: InventoryClient,
{
    store: S,
    inventory: I,
}

impl<S, I> PrintCoordinator<S, I>
where
    S: InvoiceStore,
    I: InventoryClient,
{
    /// Creates a new print coordinator.
    pub fn new(store: S, inventory: I) -> Self {
        Self { store, inventory }
    }

    /// Prints an `Open` invoice.
    ///
    /// Fails without touching the ledger if the invoice is unknown or not
    /// `Open`. A failed decrement is returned after compensation, with the
    /// invoice already `Cancelled`.
    #[tracing::instrument(skip(self))]
    pub async fn print(&self, invoice_id: InvoiceId) -> Result<PrintedInvoice> {
        metrics::counter!("invoice_print_total").increment(1);
        let started = std::time::Instant::now();

        let invoice = self
            .store
            .transition_status(invoice_id, InvoiceStatus::Open, InvoiceStatus::Processing)
            .await?;
        tracing::info!(number = invoice.number(), items = invoice.items().len(), "print saga started");

        let outcome = self.decrement_all(invoice.items()).await;
        let result = match outcome {
            Ok(()) => self.close(invoice_id).await,
            Err(cause) => self.cancel(invoice_id, cause).await,
        };

        metrics::histogram!("invoice_print_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        result
    }

    /// Loads an invoice.
    pub async fn invoice(&self, invoice_id: InvoiceId) -> Result<Invoice> {
        Ok(self.store.get_existing(invoice_id).await?)
    }

    /// Lists invoices ordered by number, optionally only those in `status`.
    pub async fn list(&self, status: Option<InvoiceStatus>) -> Result<Vec<Invoice>> {
        Ok(self.store.list(status).await?)
    }

    /// Decrements each line in order, compensating the completed ones on the
    /// first failure.
    async fn decrement_all(&self, items: &[LineItem]) -> Result<()> {
        let mut completed: Vec<&LineItem> = Vec::with_capacity(items.len());

        for item in items {
            match self.inventory.decrement(item.product_id, item.quantity).await {
                Ok(()) => {
                    tracing::info!(
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        "stock decremented"
                    );
                    completed.push(item);
                }
                Err(e) => {
                    tracing::warn!(
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        error = %e,
                        "decrement failed"
                    );
                    self.compensate(&completed).await;
                    return Err(SagaError::from_ledger(item.product_id, e));
                }
            }
        }

        Ok(())
    }

    /// Increments back every completed line, in the order they were recorded.
    ///
    /// Best effort: failures are logged and counted, never retried or
    /// returned. A product that no longer exists counts as compensated.
    #[tracing::instrument(skip(self, completed), fields(steps = completed.len()))]
    async fn compensate(&self, completed: &[&LineItem]) {
        for item in completed {
            match self.inventory.increment(item.product_id, item.quantity).await {
                Ok(()) => {
                    tracing::info!(product_id = %item.product_id, quantity = item.quantity, "stock restored");
                }
                Err(InventoryError::NotFound(_)) => {
                    tracing::info!(product_id = %item.product_id, "product gone, nothing to restore");
                }
                Err(e) => {
                    metrics::counter!("invoice_compensation_failures_total").increment(1);
                    tracing::warn!(
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        error = %e,
                        "compensation failed, ledger is short"
                    );
                }
            }
        }
    }

    async fn close(&self, invoice_id: InvoiceId) -> Result<PrintedInvoice> {
        let invoice = self
            .store
            .transition_status(invoice_id, InvoiceStatus::Processing, InvoiceStatus::Closed)
            .await?;

        metrics::counter!("invoice_print_closed_total").increment(1);
        tracing::info!(number = invoice.number(), "invoice closed");

        let products = self.lookup_names(&invoice).await;
        Ok(PrintedInvoice::enrich(invoice, &products))
    }

    async fn cancel(&self, invoice_id: InvoiceId, cause: SagaError) -> Result<PrintedInvoice> {
        self.store
            .transition_status(invoice_id, InvoiceStatus::Processing, InvoiceStatus::Cancelled)
            .await?;

        metrics::counter!("invoice_print_cancelled_total").increment(1);
        tracing::warn!(reason = %cause, "invoice cancelled");

        Err(cause)
    }

    /// Fetches the products of an invoice for display. Never fails: an
    /// unreachable ledger just yields no names.
    async fn lookup_names(&self, invoice: &Invoice) -> Vec<inventory::ProductSnapshot> {
        let mut seen = HashSet::new();
        let ids: Vec<ProductId> = invoice
            .items()
            .iter()
            .map(|item| item.product_id)
            .filter(|id| seen.insert(*id))
            .collect();

        match self.inventory.batch_get(&ids).await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, "product lookup failed, printing without names");
                Vec::new()
            }
        }
    }
}
