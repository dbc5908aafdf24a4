//! Invoice aggregate implementation.

use chrono::{DateTime, SubsecRound, Utc};
use common::{InvoiceId, LineItemId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvoiceError;

use super::{InvoiceStatus, LineDraft, LineItem};

/// A validated invoice that has not been persisted yet.
///
/// The sequence number is missing on purpose: the store assigns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub id: InvoiceId,
    pub issued_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

impl NewInvoice {
    /// Builds a new invoice from drafted lines, preserving their order.
    pub fn new(lines: Vec<LineDraft>) -> Result<Self, InvoiceError> {
        if lines.is_empty() {
            return Err(InvoiceError::NoItems);
        }

        let id = InvoiceId::new();
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                return Err(InvoiceError::InvalidQuantity {
                    quantity: line.quantity,
                });
            }
            items.push(LineItem {
                id: LineItemId::new(),
                invoice_id: id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        // Microsecond precision matches what the store can round-trip.
        Ok(Self {
            id,
            issued_at: Utc::now().trunc_subsecs(6),
            items,
        })
    }

    /// Turns the draft into an `Open` invoice carrying the given number.
    pub fn into_invoice(self, number: i64) -> Invoice {
        Invoice {
            id: self.id,
            number,
            status: InvoiceStatus::Open,
            issued_at: self.issued_at,
            items: self.items,
        }
    }
}

/// Invoice aggregate root.
///
/// Only the status ever changes after issue, and only along the edges of
/// [`InvoiceStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    number: i64,
    status: InvoiceStatus,
    issued_at: DateTime<Utc>,
    items: Vec<LineItem>,
}

// Query methods
impl Invoice {
    /// Rebuilds an invoice from stored columns.
    pub fn from_parts(
        id: InvoiceId,
        number: i64,
        status: InvoiceStatus,
        issued_at: DateTime<Utc>,
        items: Vec<LineItem>,
    ) -> Self {
        Self {
            id,
            number,
            status,
            issued_at,
            items,
        }
    }

    pub fn id(&self) -> InvoiceId {
        self.id
    }

    /// Returns the sequence number assigned at issue.
    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns the lines in their stored order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the sum of all line totals.
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(LineItem::total_price).sum()
    }

    /// Returns true if the invoice is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods
impl Invoice {
    /// Moves the invoice to `next`, rejecting anything off the state machine.
    pub fn transition(&mut self, next: InvoiceStatus) -> Result<(), InvoiceError> {
        if !self.status.can_transition_to(next) {
            return Err(InvoiceError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
