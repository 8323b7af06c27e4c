//! Seller-driven order transitions.

use core::fmt;

use super::status::OrderStatus;

/// A state-changing command a seller issues against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    /// Take a `requested` order on; it becomes `accepted`.
    Accept,
    /// Turn a `requested` order down; it becomes `rejected` for good.
    Reject,
    /// Hand over an `accepted` order; it becomes `delivered`.
    Deliver,
}

impl LifecycleAction {
    /// Every action, in the order they are offered.
    pub const ALL: [Self; 3] = [Self::Accept, Self::Reject, Self::Deliver];

    /// Final path segment of the endpoint (`/orders/:id/<segment>`).
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Deliver => "deliver",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// An action that is not valid from the order's current status.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot {action} an order that is {from}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub action: LifecycleAction,
}

impl OrderStatus {
    /// The status `action` leads to, if it is valid from here.
    ///
    /// Transitions only move forward; terminal and unknown statuses accept
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] for any pair outside the state machine.
    pub fn apply(&self, action: LifecycleAction) -> Result<Self, TransitionError> {
        match (self, action) {
            (Self::Requested | Self::Pending, LifecycleAction::Accept) => Ok(Self::Accepted),
            (Self::Requested | Self::Pending, LifecycleAction::Reject) => Ok(Self::Rejected),
            (Self::Accepted, LifecycleAction::Deliver) => Ok(Self::Delivered),
            _ => Err(TransitionError {
                from: self.clone(),
                action,
            }),
        }
    }

    /// Actions valid from this status, ignoring who is asking.
    #[must_use]
    pub fn valid_actions(&self) -> Vec<LifecycleAction> {
        LifecycleAction::ALL
            .into_iter()
            .filter(|action| self.apply(*action).is_ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert_eq!(
            OrderStatus::Requested.apply(LifecycleAction::Accept),
            Ok(OrderStatus::Accepted)
        );
        assert_eq!(
            OrderStatus::Pending.apply(LifecycleAction::Reject),
            Ok(OrderStatus::Rejected)
        );
        assert_eq!(
            OrderStatus::Accepted.apply(LifecycleAction::Deliver),
            Ok(OrderStatus::Delivered)
        );
    }

    #[test]
    fn test_no_skipping_or_regression() {
        assert!(OrderStatus::Requested.apply(LifecycleAction::Deliver).is_err());
        assert!(OrderStatus::Accepted.apply(LifecycleAction::Accept).is_err());
        assert!(OrderStatus::Accepted.apply(LifecycleAction::Reject).is_err());
    }

    #[test]
    fn test_terminal_and_unknown_accept_nothing() {
        for status in [
            OrderStatus::Delivered,
            OrderStatus::Completed,
            OrderStatus::Rejected,
            OrderStatus::Unknown("cancelled".to_owned()),
        ] {
            assert!(status.valid_actions().is_empty(), "{status:?}");
        }
    }

    #[test]
    fn test_error_message() {
        let err = OrderStatus::Rejected
            .apply(LifecycleAction::Deliver)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot deliver an order that is rejected");
    }
}
