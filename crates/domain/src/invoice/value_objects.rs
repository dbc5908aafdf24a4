//! Value objects for the invoice domain.

use common::{InvoiceId, LineItemId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A validated line waiting to be attached to a new invoice.
///
/// The unit price is the ledger price observed when the invoice was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDraft {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineDraft {
    /// Creates a new line draft.
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }
}

/// A line on an invoice.
///
/// Line items never change after the invoice is issued; the unit price is
/// frozen at issue time and is never re-read from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Identity of this line.
    pub id: LineItemId,

    /// The invoice that owns this line.
    pub invoice_id: InvoiceId,

    /// The ledger product being billed.
    pub product_id: ProductId,

    /// Quantity billed, always greater than zero.
    pub quantity: u32,

    /// Price per unit captured at issue time.
    pub unit_price: Decimal,
}

impl LineItem {
    /// Returns the total price for this line (quantity * unit_price).
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
