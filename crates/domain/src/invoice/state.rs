//! Invoice status state machine.

use serde::{Deserialize, Serialize};

/// The status of an invoice in its lifecycle.
///
/// State transitions:
/// ```text
/// Open ──► Processing ──┬──► Closed
///                       └──► Cancelled
/// ```
///
/// `Closed` and `Cancelled` are terminal. Only an `Open` invoice may start a
/// print saga; the `Open → Processing` write is what keeps a second print
/// request from reaching the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InvoiceStatus {
    /// Issued and waiting to be printed.
    #[default]
    Open,

    /// A print saga holds the invoice.
    Processing,

    /// Every line was deducted from the ledger (terminal state).
    Closed,

    /// A deduction failed and completed lines were compensated (terminal state).
    Cancelled,
}

impl InvoiceStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Open,
        InvoiceStatus::Processing,
        InvoiceStatus::Closed,
        InvoiceStatus::Cancelled,
    ];

    /// Returns true if `self → next` is an edge of the state machine.
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (InvoiceStatus::Open, InvoiceStatus::Processing)
                | (InvoiceStatus::Processing, InvoiceStatus::Closed)
                | (InvoiceStatus::Processing, InvoiceStatus::Cancelled)
        )
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Closed | InvoiceStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Open => "Open",
            InvoiceStatus::Processing => "Processing",
            InvoiceStatus::Closed => "Closed",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown invoice status '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_open() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Open);
    }

    #[test]
    fn test_allowed_transitions() {
        let allowed = [
            (InvoiceStatus::Open, InvoiceStatus::Processing),
            (InvoiceStatus::Processing, InvoiceStatus::Closed),
            (InvoiceStatus::Processing, InvoiceStatus::Cancelled),
        ];

        for from in InvoiceStatus::ALL {
            for to in InvoiceStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in InvoiceStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in InvoiceStatus::ALL {
                assert!(!from.can_transition_to(to));
            }
        }
        assert!(!InvoiceStatus::Open.is_terminal());
        assert!(!InvoiceStatus::Processing.is_terminal());
    }

    #[test]
    fn test_display_and_parse() {
        for status in InvoiceStatus::ALL {
            assert_eq!(status.to_string().parse::<InvoiceStatus>(), Ok(status));
        }
        assert_eq!("closed".parse::<InvoiceStatus>(), Ok(InvoiceStatus::Closed));
        assert!("Paid".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&InvoiceStatus::Processing).unwrap();
        assert_eq!(json, "\"Processing\"");
        let deserialized: InvoiceStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, InvoiceStatus::Processing);
    }
}
