//! Domain layer for invoicing.
//!
//! This crate provides the invoice aggregate:
//! - `Invoice` with its ordered, immutable line items
//! - `InvoiceStatus` state machine (`Open → Processing → Closed | Cancelled`)
//! - `NewInvoice` drafts validated before they reach persistence

pub mod error;
pub mod invoice;

pub use error::InvoiceError;
pub use invoice::{Invoice, InvoiceStatus, LineDraft, LineItem, NewInvoice};
