//! Invoice persistence.
//!
//! The store owns two things the saga depends on: unique, monotonically
//! increasing invoice numbers, and the compare-and-swap on the status column
//! that stands in for a cross-process lock while an invoice is printed.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::InvoiceId;
pub use error::{Result, StoreError};
pub use memory::InMemoryInvoiceStore;
pub use postgres::PostgresInvoiceStore;
pub use store::{InvoiceStore, InvoiceStoreExt};
