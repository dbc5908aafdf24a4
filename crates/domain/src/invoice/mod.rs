//! Invoice aggregate and related types.

mod aggregate;
mod state;
mod value_objects;

pub use aggregate::{Invoice, NewInvoice};
pub use state::InvoiceStatus;
pub use value_objects::{LineDraft, LineItem};
