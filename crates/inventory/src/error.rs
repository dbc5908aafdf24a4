//! Inventory client error types.

use thiserror::Error;

use crate::ProductId;

/// Failures reported by a stock ledger call.
///
/// `NotFound` and `InsufficientBalance` are answers from the ledger itself;
/// `Transport` means no trustworthy answer arrived (connection error,
/// timeout, unexpected status, unreadable body).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// The ledger has no product with this id.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The ledger refused a decrement because the balance is too low.
    #[error("Insufficient balance for product {product_id}: requested {requested}")]
    InsufficientBalance { product_id: ProductId, requested: u32 },

    /// The call did not complete.
    #[error("Inventory service unavailable: {0}")]
    Transport(String),
}

impl InventoryError {
    /// Returns true if the failure happened below the application layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, InventoryError::Transport(_))
    }
}
