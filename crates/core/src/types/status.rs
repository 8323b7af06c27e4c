//! Order status and the views derived from it.
//!
//! The server owns the order state machine:
//!
//! ```text
//! requested --accept--> accepted --deliver--> delivered
//!     |
//!     +------reject---> rejected
//! ```
//!
//! `pending` is an older spelling of `requested` that still shows up in
//! responses, and `completed` is treated like `delivered`. Status strings
//! the client does not recognize are kept verbatim in
//! [`OrderStatus::Unknown`] instead of being folded into a known state.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Status of an order as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Created by a buyer, waiting for the seller.
    Requested,
    /// Legacy spelling of [`Self::Requested`].
    Pending,
    /// Seller accepted; delivery is being coordinated.
    Accepted,
    /// Seller handed the goods over. Terminal.
    Delivered,
    /// Alternate spelling of [`Self::Delivered`]. Terminal.
    Completed,
    /// Seller declined. Terminal.
    Rejected,
    /// Any status string this client does not know.
    Unknown(String),
}

impl OrderStatus {
    /// Parse a wire status. Never fails; unrecognized values become
    /// [`Self::Unknown`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "requested" => Self::Requested,
            "pending" => Self::Pending,
            "accepted" => Self::Accepted,
            "delivered" => Self::Delivered,
            "completed" => Self::Completed,
            "rejected" => Self::Rejected,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Requested => "requested",
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Unknown(raw) => raw,
        }
    }

    /// Whether the seller has yet to answer (`requested` or legacy `pending`).
    #[must_use]
    pub const fn is_awaiting_seller(&self) -> bool {
        matches!(self, Self::Requested | Self::Pending)
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Completed | Self::Rejected)
    }

    /// Rendering category. A partition: every status has exactly one.
    #[must_use]
    pub const fn category(&self) -> StatusCategory {
        match self {
            Self::Requested | Self::Pending => StatusCategory::Open,
            Self::Accepted => StatusCategory::InProgress,
            Self::Delivered | Self::Completed => StatusCategory::Completed,
            Self::Rejected => StatusCategory::Rejected,
            Self::Unknown(_) => StatusCategory::Unknown,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Requested | Self::Pending => "requested".to_owned(),
            Self::Accepted => "accepted".to_owned(),
            Self::Delivered | Self::Completed => "delivered".to_owned(),
            Self::Rejected => "rejected".to_owned(),
            Self::Unknown(raw) => format!("unknown status ({raw})"),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Mutually exclusive rendering buckets for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusCategory {
    /// Waiting for the seller.
    Open,
    /// Accepted, not yet delivered.
    InProgress,
    /// Delivered.
    Completed,
    /// Rejected by the seller.
    Rejected,
    /// Unrecognized status; rendered as an explicit fallback.
    Unknown,
}

/// Named list views over orders.
///
/// These overlap (`requested` is both incoming for the seller and active
/// for the buyer), so they are predicates rather than a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    /// Seller's incoming orders: exactly `requested`.
    Incoming,
    /// Buyer's active purchases: `requested` or `pending`.
    Active,
    /// Finished orders: `completed` or `delivered`.
    Completed,
    /// Declined orders: exactly `rejected`.
    Rejected,
}

impl StatusFilter {
    /// Whether `status` belongs to this view.
    #[must_use]
    pub const fn matches(self, status: &OrderStatus) -> bool {
        match self {
            Self::Incoming => matches!(status, OrderStatus::Requested),
            Self::Active => status.is_awaiting_seller(),
            Self::Completed => matches!(status, OrderStatus::Completed | OrderStatus::Delivered),
            Self::Rejected => matches!(status, OrderStatus::Rejected),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_round_trips() {
        let status: OrderStatus = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown("on_hold".to_owned()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"on_hold\"");
        assert_eq!(status.category(), StatusCategory::Unknown);
        assert_eq!(status.label(), "unknown status (on_hold)");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::Requested.is_terminal());
        assert!(!OrderStatus::Accepted.is_terminal());
        assert!(!OrderStatus::Unknown("x".to_owned()).is_terminal());
    }

    #[test]
    fn test_incoming_is_exactly_requested() {
        assert!(StatusFilter::Incoming.matches(&OrderStatus::Requested));
        assert!(!StatusFilter::Incoming.matches(&OrderStatus::Pending));
        assert!(!StatusFilter::Incoming.matches(&OrderStatus::Accepted));
    }

    #[test]
    fn test_active_tolerates_legacy_pending() {
        assert!(StatusFilter::Active.matches(&OrderStatus::Requested));
        assert!(StatusFilter::Active.matches(&OrderStatus::Pending));
        assert!(!StatusFilter::Active.matches(&OrderStatus::Accepted));
    }

    #[test]
    fn test_completed_and_rejected_filters() {
        assert!(StatusFilter::Completed.matches(&OrderStatus::Delivered));
        assert!(StatusFilter::Completed.matches(&OrderStatus::Completed));
        assert!(!StatusFilter::Completed.matches(&OrderStatus::Rejected));
        assert!(StatusFilter::Rejected.matches(&OrderStatus::Rejected));
        assert!(!StatusFilter::Rejected.matches(&OrderStatus::Unknown("cancelled".to_owned())));
    }

    #[test]
    fn test_unknown_matches_no_filter() {
        let unknown = OrderStatus::parse("refunded");
        for filter in [
            StatusFilter::Incoming,
            StatusFilter::Active,
            StatusFilter::Completed,
            StatusFilter::Rejected,
        ] {
            assert!(!filter.matches(&unknown));
        }
    }
}
