use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{Invoice, InvoiceStatus, NewInvoice};
use tokio::sync::RwLock;

use crate::{
    InvoiceId, Result, StoreError,
    store::{InvoiceStore, validate_transition},
};

#[derive(Debug, Default)]
struct MemoryState {
    invoices: HashMap<InvoiceId, Invoice>,
    last_number: i64,
}

/// In-memory invoice store.
///
/// Provides the same guarantees as the PostgreSQL implementation: numbering
/// and the status compare-and-swap both happen under a single write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvoiceStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryInvoiceStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of invoices stored.
    pub async fn invoice_count(&self) -> usize {
        self.state.read().await.invoices.len()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn insert(&self, invoice: NewInvoice) -> Result<Invoice> {
        let mut state = self.state.write().await;

        state.last_number += 1;
        let invoice = invoice.into_invoice(state.last_number);
        state.invoices.insert(invoice.id(), invoice.clone());

        Ok(invoice)
    }

    async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        Ok(self.state.read().await.invoices.get(&id).cloned())
    }

    async fn list(&self, status: Option<InvoiceStatus>) -> Result<Vec<Invoice>> {
        let state = self.state.read().await;
        let mut invoices: Vec<_> = state
            .invoices
            .values()
            .filter(|invoice| status.is_none_or(|s| invoice.status() == s))
            .cloned()
            .collect();
        invoices.sort_by_key(Invoice::number);
        Ok(invoices)
    }

    async fn transition_status(
        &self,
        id: InvoiceId,
        expected: InvoiceStatus,
        next: InvoiceStatus,
    ) -> Result<Invoice> {
        validate_transition(expected, next)?;

        let mut state = self.state.write().await;
        let invoice = state
            .invoices
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;

        if invoice.status() != expected {
            return Err(StoreError::StatusConflict {
                invoice_id: id,
                expected,
                actual: invoice.status(),
            });
        }

        invoice.transition(next)?;
        Ok(invoice.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InvoiceStoreExt;
    use common::ProductId;
    use domain::LineDraft;
    use rust_decimal_macros::dec;

    fn new_invoice() -> NewInvoice {
        NewInvoice::new(vec![
            LineDraft::new(ProductId::new(), 3, dec!(9.90)),
            LineDraft::new(ProductId::new(), 1, dec!(100)),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_numbers() {
        let store = InMemoryInvoiceStore::new();

        let first = store.insert(new_invoice()).await.unwrap();
        let second = store.insert(new_invoice()).await.unwrap();
        let third = store.insert(new_invoice()).await.unwrap();

        assert_eq!(first.number(), 1);
        assert_eq!(second.number(), 2);
        assert_eq!(third.number(), 3);
        assert_eq!(first.status(), InvoiceStatus::Open);
        assert_eq!(store.invoice_count().await, 3);
    }

    #[tokio::test]
    async fn test_get_preserves_item_order() {
        let store = InMemoryInvoiceStore::new();
        let draft = new_invoice();
        let expected: Vec<_> = draft.items.iter().map(|i| i.product_id).collect();

        let inserted = store.insert(draft).await.unwrap();
        let loaded = store.get_existing(inserted.id()).await.unwrap();

        let products: Vec<_> = loaded.items().iter().map(|i| i.product_id).collect();
        assert_eq!(products, expected);
        assert_eq!(loaded, inserted);
    }

    #[tokio::test]
    async fn test_get_missing_invoice() {
        let store = InMemoryInvoiceStore::new();
        let id = InvoiceId::new();

        assert!(store.get(id).await.unwrap().is_none());
        assert!(matches!(
            store.get_existing(id).await,
            Err(StoreError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_transition_compare_and_swap() {
        let store = InMemoryInvoiceStore::new();
        let invoice = store.insert(new_invoice()).await.unwrap();

        let processing = store
            .transition_status(invoice.id(), InvoiceStatus::Open, InvoiceStatus::Processing)
            .await
            .unwrap();
        assert_eq!(processing.status(), InvoiceStatus::Processing);

        let second = store
            .transition_status(invoice.id(), InvoiceStatus::Open, InvoiceStatus::Processing)
            .await;
        assert!(matches!(
            second,
            Err(StoreError::StatusConflict {
                expected: InvoiceStatus::Open,
                actual: InvoiceStatus::Processing,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_transition_rejects_invalid_edge() {
        let store = InMemoryInvoiceStore::new();
        let invoice = store.insert(new_invoice()).await.unwrap();

        let result = store
            .transition_status(invoice.id(), InvoiceStatus::Open, InvoiceStatus::Closed)
            .await;
        assert!(matches!(result, Err(StoreError::Invoice(_))));

        let loaded = store.get_existing(invoice.id()).await.unwrap();
        assert_eq!(loaded.status(), InvoiceStatus::Open);
    }

    #[tokio::test]
    async fn test_transition_unknown_invoice() {
        let store = InMemoryInvoiceStore::new();
        let result = store
            .transition_status(
                InvoiceId::new(),
                InvoiceStatus::Open,
                InvoiceStatus::Processing,
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_transitions_have_one_winner() {
        let store = InMemoryInvoiceStore::new();
        let invoice = store.insert(new_invoice()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let id = invoice.id();
            handles.push(tokio::spawn(async move {
                store
                    .transition_status(id, InvoiceStatus::Open, InvoiceStatus::Processing)
                    .await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let store = InMemoryInvoiceStore::new();
        let a = store.insert(new_invoice()).await.unwrap();
        let b = store.insert(new_invoice()).await.unwrap();
        store
            .transition_status(b.id(), InvoiceStatus::Open, InvoiceStatus::Processing)
            .await
            .unwrap();

        let all = store.list(None).await.unwrap();
        assert_eq!(
            all.iter().map(Invoice::id).collect::<Vec<_>>(),
            vec![a.id(), b.id()]
        );

        let open = store.list(Some(InvoiceStatus::Open)).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id(), a.id());

        let processing = store.list(Some(InvoiceStatus::Processing)).await.unwrap();
        assert_eq!(processing.len(), 1);
        assert_eq!(processing[0].id(), b.id());

        assert!(store.list(Some(InvoiceStatus::Closed)).await.unwrap().is_empty());
    }
}
