//! Domain error types.

use thiserror::Error;

use crate::invoice::InvoiceStatus;

/// Errors raised by the invoice aggregate itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    /// The requested status change is not an edge of the state machine.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    /// An invoice must carry at least one line.
    #[error("Invoice must contain at least one item")]
    NoItems,

    /// Line quantities must be positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },
}
