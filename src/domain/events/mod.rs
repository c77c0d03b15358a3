//! Domain events
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::lifecycle::OrderStatus;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "aggregate", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Payment(PaymentEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, customer_id: String, total: Money },
    StatusChanged { order_id: Uuid, customer_id: String, from: OrderStatus, to: OrderStatus, actor: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PaymentEvent {
    Opened { payment_id: Uuid, order_id: Uuid, customer_id: String, amount: Money, expired_at: DateTime<Utc> },
    ProofSubmitted { payment_id: Uuid, order_id: Uuid, customer_id: String },
    Confirmed { payment_id: Uuid, order_id: Uuid, customer_id: String, confirmed_by: String },
    Rejected { payment_id: Uuid, order_id: Uuid, customer_id: String, reason: String },
    Expired { payment_id: Uuid, order_id: Uuid, customer_id: String },
}

impl DomainEvent {
    /// NATS subject, `storefront.<aggregate>.<event>`.
    pub fn subject(&self) -> String {
        let (aggregate, event) = match self {
            Self::Order(e) => ("order", match e {
                OrderEvent::Placed { .. } => "placed",
                OrderEvent::StatusChanged { .. } => "status_changed",
            }),
            Self::Payment(e) => ("payment", match e {
                PaymentEvent::Opened { .. } => "opened",
                PaymentEvent::ProofSubmitted { .. } => "proof_submitted",
                PaymentEvent::Confirmed { .. } => "confirmed",
                PaymentEvent::Rejected { .. } => "rejected",
                PaymentEvent::Expired { .. } => "expired",
            }),
        };
        format!("storefront.{aggregate}.{event}")
    }

    pub fn customer_id(&self) -> &str {
        match self {
            Self::Order(OrderEvent::Placed { customer_id, .. })
            | Self::Order(OrderEvent::StatusChanged { customer_id, .. })
            | Self::Payment(PaymentEvent::Opened { customer_id, .. })
            | Self::Payment(PaymentEvent::ProofSubmitted { customer_id, .. })
            | Self::Payment(PaymentEvent::Confirmed { customer_id, .. })
            | Self::Payment(PaymentEvent::Rejected { customer_id, .. })
            | Self::Payment(PaymentEvent::Expired { customer_id, .. }) => customer_id,
        }
    }

    /// One-line human readable summary, pushed into the customer's support room.
    pub fn summary(&self) -> String {
        match self {
            Self::Order(OrderEvent::Placed { total, .. }) => format!("Order placed, total {total}"),
            Self::Order(OrderEvent::StatusChanged { to, .. }) => format!("Order status is now {to}"),
            Self::Payment(PaymentEvent::Opened { amount, expired_at, .. }) => {
                format!("Please transfer {amount} and upload your proof before {}", expired_at.format("%H:%M:%S UTC"))
            }
            Self::Payment(PaymentEvent::ProofSubmitted { .. }) => "Proof of payment received, awaiting review".to_string(),
            Self::Payment(PaymentEvent::Confirmed { .. }) => "Payment confirmed".to_string(),
            Self::Payment(PaymentEvent::Rejected { reason, .. }) => format!("Payment rejected: {reason}"),
            Self::Payment(PaymentEvent::Expired { .. }) => "Payment window expired".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_and_payload() {
        let e = DomainEvent::Order(OrderEvent::StatusChanged {
            order_id: Uuid::nil(), customer_id: "c1".into(),
            from: OrderStatus::Processing, to: OrderStatus::Confirmed, actor: "admin:a1".into(),
        });
        assert_eq!(e.subject(), "storefront.order.status_changed");
        assert_eq!(e.customer_id(), "c1");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["aggregate"], "order");
        assert_eq!(json["event"], "status_changed");
        assert_eq!(json["to"], "confirmed");
    }
}
