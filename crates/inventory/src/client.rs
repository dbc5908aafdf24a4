//! The stock ledger capability set.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{InventoryError, ProductId};

/// A point-in-time view of one product in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub balance: u32,
}

/// Operations the invoicing side may perform against the stock ledger.
///
/// Every call is awaited to completion before the caller issues the next
/// one. The ledger guarantees that `decrement` checks and subtracts in a
/// single atomic step, so concurrent sagas on the same product cannot both
/// spend the same units.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Fetches a live snapshot of one product.
    async fn get(&self, product_id: ProductId) -> Result<ProductSnapshot, InventoryError>;

    /// Fetches snapshots for several products.
    ///
    /// Unknown ids are simply absent from the result.
    async fn batch_get(&self, ids: &[ProductId]) -> Result<Vec<ProductSnapshot>, InventoryError>;

    /// Subtracts `quantity` if and only if the balance covers it.
    async fn decrement(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError>;

    /// Adds `quantity` back to the balance.
    async fn increment(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError>;
}

#[async_trait]
impl<T: InventoryClient + ?Sized> InventoryClient for Arc<T> {
    async fn get(&self, product_id: ProductId) -> Result<ProductSnapshot, InventoryError> {
        (**self).get(product_id).await
    }

    async fn batch_get(&self, ids: &[ProductId]) -> Result<Vec<ProductSnapshot>, InventoryError> {
        (**self).batch_get(ids).await
    }

    async fn decrement(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
        (**self).decrement(product_id, quantity).await
    }

    async fn increment(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
        (**self).increment(product_id, quantity).await
    }
}
