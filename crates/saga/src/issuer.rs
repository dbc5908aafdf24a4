//! Invoice issue: checks each requested line against the ledger and
//! persists the invoice `Open` with prices frozen.

use common::ProductId;
use domain::{Invoice, LineDraft, NewInvoice};
use inventory::InventoryClient;
use invoice_store::InvoiceStore;

use crate::error::{Result, SagaError};

/// One requested line of a new invoice.
///
/// The quantity is signed so that zero and negative requests reach the
/// validator and get a meaningful error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl ItemRequest {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Issues new invoices.
///
/// The balance check is advisory: nothing is reserved, so stock can still be
/// drained by someone else before the invoice is printed.
pub struct InvoiceIssuer<S, I>
where
    S: InvoiceStore,
    I: InventoryClient,
{
    store: S,
    inventory: I,
}

impl<S, I> InvoiceIssuer<S, I>
where
    S: InvoiceStore,
    I: InventoryClient,
{
    pub fn new(store: S, inventory: I) -> Self {
        Self { store, inventory }
    }

    /// Validates every request against a live snapshot and persists the
    /// invoice in status `Open`.
    ///
    /// Lines are checked in order and the first failure wins; nothing is
    /// persisted unless every line passes.
    #[tracing::instrument(skip(self, requests), fields(items = requests.len()))]
    pub async fn issue(&self, requests: Vec<ItemRequest>) -> Result<Invoice> {
        if requests.is_empty() {
            return Err(SagaError::EmptyInvoice);
        }

        let mut drafts = Vec::with_capacity(requests.len());
        for request in &requests {
            drafts.push(self.check_line(request).await?);
        }

        let invoice = self.store.insert(NewInvoice::new(drafts)?).await?;

        metrics::counter!("invoices_issued_total").increment(1);
        tracing::info!(
            invoice_id = %invoice.id(),
            number = invoice.number(),
            total = %invoice.total_amount(),
            "invoice issued"
        );

        Ok(invoice)
    }

    async fn check_line(&self, request: &ItemRequest) -> Result<LineDraft> {
        let ItemRequest {
            product_id,
            quantity,
        } = *request;

        let requested = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(SagaError::InvalidQuantity {
                product_id,
                quantity,
            })?;

        let snapshot = self
            .inventory
            .get(product_id)
            .await
            .map_err(|e| SagaError::from_ledger(product_id, e))?;

        if requested > snapshot.balance {
            return Err(SagaError::InsufficientStock {
                product_id,
                requested: quantity,
                available: Some(snapshot.balance),
            });
        }

        Ok(LineDraft::new(product_id, requested, snapshot.price))
    }
}
