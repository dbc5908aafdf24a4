//! Identifier types shared by every crate in the invoicing workspace.

mod types;

pub use types::{InvoiceId, LineItemId, ProductId};
