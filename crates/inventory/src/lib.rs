//! Remote stock ledger access.
//!
//! The ledger is owned by the inventory service and reached only over the
//! network. This crate provides:
//! - `InventoryClient`, the capability set the invoicing side consumes
//!   (`get`, `batch_get`, `decrement`, `increment`)
//! - `HttpInventoryClient`, the production implementation over HTTP
//! - `InMemoryStockLedger`, a deterministic in-process ledger with fault
//!   injection, used to exercise sagas without network I/O

pub mod client;
pub mod error;
pub mod http;
pub mod memory;

pub use client::{InventoryClient, ProductSnapshot};
pub use common::ProductId;
pub use error::InventoryError;
pub use http::HttpInventoryClient;
pub use memory::{CallCounts, InMemoryStockLedger};
