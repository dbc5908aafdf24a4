//! In-process stock ledger.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::{InventoryClient, InventoryError, ProductId, ProductSnapshot};

/// Number of calls the ledger has received, per operation.
///
/// Failed calls count too: a call is recorded as soon as it reaches the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get: usize,
    pub batch_get: usize,
    pub decrement: usize,
    pub increment: usize,
}

#[derive(Debug, Default)]
struct LedgerState {
    products: HashMap<ProductId, ProductSnapshot>,
    calls: CallCounts,
    unavailable: bool,
    fail_decrement_for: HashSet<ProductId>,
    fail_on_increment: bool,
    fail_on_batch_get: bool,
}

impl LedgerState {
    fn check_available(&self) -> Result<(), InventoryError> {
        if self.unavailable {
            return Err(InventoryError::Transport(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

/// In-memory stock ledger.
///
/// Every operation runs under one lock, which makes `decrement` an atomic
/// check-and-subtract just like the real ledger. Faults can be injected to
/// simulate transport failures at specific points of a saga.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryStockLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a product and returns its id.
    pub async fn add_product(
        &self,
        name: impl Into<String>,
        price: Decimal,
        balance: u32,
    ) -> ProductId {
        let id = ProductId::new();
        let snapshot = ProductSnapshot {
            id,
            name: name.into(),
            price,
            balance,
        };
        self.state.lock().await.products.insert(id, snapshot);
        id
    }

    /// Removes a product, as if it had been deleted from the inventory service.
    pub async fn remove_product(&self, product_id: ProductId) {
        self.state.lock().await.products.remove(&product_id);
    }

    /// Changes the current price of a product.
    pub async fn set_price(&self, product_id: ProductId, price: Decimal) {
        if let Some(product) = self.state.lock().await.products.get_mut(&product_id) {
            product.price = price;
        }
    }

    /// Overwrites the balance of a product.
    pub async fn set_balance(&self, product_id: ProductId, balance: u32) {
        if let Some(product) = self.state.lock().await.products.get_mut(&product_id) {
            product.balance = balance;
        }
    }

    /// Returns the current balance, or None for an unknown product.
    pub async fn balance(&self, product_id: ProductId) -> Option<u32> {
        self.state
            .lock()
            .await
            .products
            .get(&product_id)
            .map(|p| p.balance)
    }

    /// Returns how many calls of each kind the ledger has received.
    pub async fn calls(&self) -> CallCounts {
        self.state.lock().await.calls
    }

    /// Makes every call fail with a transport error.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// Makes decrements of one product fail with a transport error.
    pub async fn fail_decrement_for(&self, product_id: ProductId) {
        self.state
            .lock()
            .await
            .fail_decrement_for
            .insert(product_id);
    }

    /// Makes increments fail with a transport error.
    pub async fn set_fail_on_increment(&self, fail: bool) {
        self.state.lock().await.fail_on_increment = fail;
    }

    /// Makes batch lookups fail with a transport error.
    pub async fn set_fail_on_batch_get(&self, fail: bool) {
        self.state.lock().await.fail_on_batch_get = fail;
    }
}

#[async_trait]
impl InventoryClient for InMemoryStockLedger {
    async fn get(&self, product_id: ProductId) -> Result<ProductSnapshot, InventoryError> {
        let mut state = self.state.lock().await;
        state.calls.get += 1;
        state.check_available()?;

        state
            .products
            .get(&product_id)
            .cloned()
            .ok_or(InventoryError::NotFound(product_id))
    }

    async fn batch_get(&self, ids: &[ProductId]) -> Result<Vec<ProductSnapshot>, InventoryError> {
        let mut state = self.state.lock().await;
        state.calls.batch_get += 1;
        state.check_available()?;

        if state.fail_on_batch_get {
            return Err(InventoryError::Transport("batch lookup timed out".to_string()));
        }

        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    async fn decrement(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
        let mut state = self.state.lock().await;
        state.calls.decrement += 1;
        state.check_available()?;

        if state.fail_decrement_for.contains(&product_id) {
            return Err(InventoryError::Transport(format!(
                "timed out decrementing {product_id}"
            )));
        }

        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(InventoryError::NotFound(product_id))?;

        if product.balance < quantity {
            return Err(InventoryError::InsufficientBalance {
                product_id,
                requested: quantity,
            });
        }

        product.balance -= quantity;
        Ok(())
    }

    async fn increment(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
        let mut state = self.state.lock().await;
        state.calls.increment += 1;
        state.check_available()?;

        if state.fail_on_increment {
            return Err(InventoryError::Transport(format!(
                "timed out incrementing {product_id}"
            )));
        }

        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(InventoryError::NotFound(product_id))?;

        product.balance = product.balance.saturating_add(quantity);
        Ok(())
    }
}
