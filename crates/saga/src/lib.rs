//! Invoice issue and the print saga.
//!
//! Printing an invoice deducts its stock from a remote ledger that offers no
//! transactions. The saga decrements each line in order and, when a step
//! fails, increments the completed lines back before cancelling the invoice:
//!
//! 1. Lock the invoice (`Open → Processing`)
//! 2. Decrement every line, in stored order
//! 3. Close the invoice, or compensate and cancel it
//! 4. Resolve product names for the printout, best effort

pub mod coordinator;
pub mod error;
pub mod issuer;
pub mod printed;

pub use coordinator::PrintCoordinator;
pub use error::{Result, SagaError};
pub use issuer::{InvoiceIssuer, ItemRequest};
pub use printed::{PRODUCT_NOT_FOUND_NAME, PrintedInvoice, PrintedLine};
