//! Order and payment status model.
//!
//! [`OrderStatus::rule`] is the single transition table of the order workflow:
//! every state-changing operation on an order consults it, nothing else
//! compares statuses to decide whether a move is legal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::value_objects::Role;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Processing,
    Confirmed,
    BeingPacked,
    ManagedByExpedition,
    Shipped,
    Delivered,
    Accepted,
    Cancelled,
    ReturnRequested,
    ReturnApproved,
    ReturnRejected,
    ReturnShipped,
    ReturnReceived,
}

const ADMIN: &[Role] = &[Role::Admin];
const CUSTOMER: &[Role] = &[Role::Customer];
const ANYONE: &[Role] = &[Role::Customer, Role::Admin];

impl OrderStatus {
    pub const ALL: [OrderStatus; 13] = [
        Self::Processing, Self::Confirmed, Self::BeingPacked, Self::ManagedByExpedition,
        Self::Shipped, Self::Delivered, Self::Accepted, Self::Cancelled,
        Self::ReturnRequested, Self::ReturnApproved, Self::ReturnRejected,
        Self::ReturnShipped, Self::ReturnReceived,
    ];

    /// Roles allowed to move an order from `self` to `to`, `None` when the move is not in the table.
    pub fn rule(self, to: OrderStatus) -> Option<&'static [Role]> {
        use OrderStatus::*;
        match (self, to) {
            (Processing, Confirmed) => Some(ADMIN),
            (Confirmed, BeingPacked) => Some(ADMIN),
            (BeingPacked, ManagedByExpedition) => Some(ADMIN),
            (ManagedByExpedition, Shipped) => Some(ADMIN),
            (Shipped, Delivered) => Some(ADMIN),
            (Delivered, Accepted) => Some(ANYONE),
            (Processing | Confirmed | BeingPacked, Cancelled) => Some(ANYONE),
            (Accepted, ReturnRequested) => Some(CUSTOMER),
            (ReturnRequested, ReturnApproved | ReturnRejected) => Some(ADMIN),
            (ReturnApproved, ReturnShipped) => Some(CUSTOMER),
            (ReturnShipped, ReturnReceived) => Some(ADMIN),
            _ => None,
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool { self.rule(to).is_some() }

    pub fn permits(self, to: OrderStatus, role: Role) -> bool {
        self.rule(to).is_some_and(|roles| roles.contains(&role))
    }

    pub fn next_states(self) -> Vec<OrderStatus> {
        Self::ALL.into_iter().filter(|to| self.can_transition_to(*to)).collect()
    }

    pub fn is_terminal(self) -> bool { self.next_states().is_empty() }

    pub fn is_cancellable(self) -> bool { self.can_transition_to(Self::Cancelled) }

    pub fn is_return_flow(self) -> bool {
        matches!(self, Self::ReturnRequested | Self::ReturnApproved | Self::ReturnRejected | Self::ReturnShipped | Self::ReturnReceived)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Confirmed => "confirmed",
            Self::BeingPacked => "being_packed",
            Self::ManagedByExpedition => "managed_by_expedition",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Accepted => "accepted",
            Self::Cancelled => "cancelled",
            Self::ReturnRequested => "return_requested",
            Self::ReturnApproved => "return_approved",
            Self::ReturnRejected => "return_rejected",
            Self::ReturnShipped => "return_shipped",
            Self::ReturnReceived => "return_received",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Status of a single payment, mirrored onto the order it settles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Expired,
    Confirmed,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Expired => "expired",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_fulfilment_path_is_linear() {
        let path = [Processing, Confirmed, BeingPacked, ManagedByExpedition, Shipped, Delivered, Accepted];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(!Processing.can_transition_to(Shipped));
        assert!(!Delivered.can_transition_to(Shipped));
    }

    #[test]
    fn test_cancel_only_before_expedition() {
        assert!(Processing.is_cancellable());
        assert!(Confirmed.is_cancellable());
        assert!(BeingPacked.is_cancellable());
        assert!(!ManagedByExpedition.is_cancellable());
        assert!(!Shipped.is_cancellable());
        assert!(!Accepted.is_cancellable());
    }

    #[test]
    fn test_return_branch() {
        assert_eq!(Accepted.next_states(), vec![ReturnRequested]);
        assert_eq!(ReturnRequested.next_states(), vec![ReturnApproved, ReturnRejected]);
        assert_eq!(ReturnApproved.next_states(), vec![ReturnShipped]);
        assert_eq!(ReturnShipped.next_states(), vec![ReturnReceived]);
        assert!(!Delivered.can_transition_to(ReturnRequested));
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = OrderStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![Cancelled, ReturnRejected, ReturnReceived]);
    }

    #[test]
    fn test_role_permissions() {
        assert!(Processing.permits(Confirmed, Role::Admin));
        assert!(!Processing.permits(Confirmed, Role::Customer));
        assert!(Accepted.permits(ReturnRequested, Role::Customer));
        assert!(!Accepted.permits(ReturnRequested, Role::Admin));
        assert!(Delivered.permits(Accepted, Role::Customer));
        assert!(Processing.permits(Cancelled, Role::Customer));
    }

    #[test]
    fn test_status_strings() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("on_hold".parse::<OrderStatus>().is_err());
    }
}
