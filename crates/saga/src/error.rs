//! Saga error types.

use common::{InvoiceId, ProductId};
use domain::{InvoiceError, InvoiceStatus};
use inventory::InventoryError;
use invoice_store::StoreError;
use thiserror::Error;

/// Errors that can occur while issuing or printing an invoice.
#[derive(Debug, Error)]
pub enum SagaError {
    /// No invoice exists with the given id.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// The invoice is not in the status the operation requires.
    #[error("Invalid invoice state: expected {expected}, actual {actual}")]
    InvalidState {
        expected: InvoiceStatus,
        actual: InvoiceStatus,
    },

    /// The ledger does not know the product.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A requested quantity was zero or negative.
    #[error("Invalid quantity {quantity} for product {product_id}: must be greater than 0")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    /// The ledger balance does not cover the requested quantity.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}{}",
        available_suffix(.available)
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: Option<u32>,
    },

    /// An invoice must carry at least one line.
    #[error("Invoice must contain at least one item")]
    EmptyInvoice,

    /// The ledger could not be reached or did not answer in time.
    #[error("Inventory service unavailable: {0}")]
    RemoteUnavailable(String),

    /// The invoice aggregate rejected the operation.
    #[error("Invoice error: {0}")]
    Domain(#[from] InvoiceError),

    /// Invoice persistence failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}

fn available_suffix(available: &Option<u32>) -> String {
    available
        .map(|balance| format!(", available {balance}"))
        .unwrap_or_default()
}

impl SagaError {
    /// Builds the error for a failed ledger call made on behalf of `product_id`.
    pub(crate) fn from_ledger(product_id: ProductId, err: InventoryError) -> Self {
        match err {
            InventoryError::NotFound(missing) => SagaError::ProductNotFound(missing),
            InventoryError::InsufficientBalance { requested, .. } => SagaError::InsufficientStock {
                product_id,
                requested: i64::from(requested),
                available: None,
            },
            InventoryError::Transport(reason) => {
                SagaError::RemoteUnavailable(format!("product {product_id}: {reason}"))
            }
        }
    }
}

impl From<StoreError> for SagaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SagaError::InvoiceNotFound(id),
            StoreError::StatusConflict {
                expected, actual, ..
            } => SagaError::InvalidState { expected, actual },
            StoreError::Invoice(e) => SagaError::Domain(e),
            other => SagaError::Store(other),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
