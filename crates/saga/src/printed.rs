//! The enriched invoice returned by a successful print.

use std::collections::HashMap;

use common::ProductId;
use domain::{Invoice, LineItem};
use inventory::ProductSnapshot;

/// Name shown for a line whose product could not be resolved.
pub const PRODUCT_NOT_FOUND_NAME: &str = "product not found";

/// A line of a printed invoice with its product name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedLine {
    pub item: LineItem,
    pub product_name: String,
}

/// An invoice after a successful print, one [`PrintedLine`] per item in
/// stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedInvoice {
    pub invoice: Invoice,
    pub lines: Vec<PrintedLine>,
}

impl PrintedInvoice {
    /// Pairs every item with the name found in `products`, falling back to
    /// [`PRODUCT_NOT_FOUND_NAME`].
    pub fn enrich(invoice: Invoice, products: &[ProductSnapshot]) -> Self {
        let names: HashMap<ProductId, &str> = products
            .iter()
            .map(|p| (p.id, p.name.as_str()))
            .collect();

        let lines = invoice
            .items()
            .iter()
            .map(|item| PrintedLine {
                item: item.clone(),
                product_name: names
                    .get(&item.product_id)
                    .copied()
                    .unwrap_or(PRODUCT_NOT_FOUND_NAME)
                    .to_string(),
            })
            .collect();

        Self { invoice, lines }
    }

    /// Returns true if every line resolved to a real product name.
    pub fn fully_resolved(&self) -> bool {
        self.lines
            .iter()
            .all(|line| line.product_name != PRODUCT_NOT_FOUND_NAME)
    }
}
