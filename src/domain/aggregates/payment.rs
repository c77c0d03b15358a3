//! Payment Aggregate
//!
//! A manual bank-transfer style payment: the customer uploads a proof image,
//! an admin reviews it. The payment is only valid inside its expiry window and
//! that window is evaluated lazily, whenever the payment is touched.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::Order;
use crate::domain::events::{DomainEvent, PaymentEvent};
use crate::domain::lifecycle::PaymentStatus;
use crate::domain::value_objects::{Actor, Money, PaymentMethod};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    id: Uuid,
    order_id: Uuid,
    customer_id: String,
    method: PaymentMethod,
    amount: Money,
    status: PaymentStatus,
    proof_image: Option<String>,
    proof_submitted_at: Option<DateTime<Utc>>,
    expired_at: DateTime<Utc>,
    confirmed_by: Option<String>,
    confirmed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Payment {
    /// `amount` must already be expressed in the currency of `order`'s payment method.
    pub fn open(order: &Order, amount: Money, window: Duration, now: DateTime<Utc>) -> Self {
        let mut payment = Self {
            id: Uuid::now_v7(), order_id: order.id(), customer_id: order.customer_id().to_string(),
            method: order.payment_method(), amount, status: PaymentStatus::Pending,
            proof_image: None, proof_submitted_at: None, expired_at: now + window,
            confirmed_by: None, confirmed_at: None, rejection_reason: None,
            version: 0, created_at: now, updated_at: now, events: vec![],
        };
        payment.raise_event(DomainEvent::Payment(PaymentEvent::Opened {
            payment_id: payment.id, order_id: payment.order_id, customer_id: payment.customer_id.clone(),
            amount: payment.amount.clone(), expired_at: payment.expired_at,
        }));
        payment
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_id(&self) -> Uuid { self.order_id }
    pub fn customer_id(&self) -> &str { &self.customer_id }
    pub fn method(&self) -> PaymentMethod { self.method }
    pub fn amount(&self) -> &Money { &self.amount }
    pub fn status(&self) -> PaymentStatus { self.status }
    pub fn proof_image(&self) -> Option<&str> { self.proof_image.as_deref() }
    pub fn expired_at(&self) -> DateTime<Utc> { self.expired_at }
    pub fn confirmed_by(&self) -> Option<&str> { self.confirmed_by.as_deref() }
    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> { self.confirmed_at }
    pub fn rejection_reason(&self) -> Option<&str> { self.rejection_reason.as_deref() }
    pub fn version(&self) -> u64 { self.version }
    pub fn set_version(&mut self, version: u64) { self.version = version; }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Pending and still inside its window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == PaymentStatus::Pending && now <= self.expired_at
    }

    /// Moves a pending payment past its deadline to `Expired`. Returns whether it changed.
    pub fn refresh_expiry(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != PaymentStatus::Pending || now <= self.expired_at { return false; }
        self.status = PaymentStatus::Expired;
        self.updated_at = now;
        self.raise_event(DomainEvent::Payment(PaymentEvent::Expired {
            payment_id: self.id, order_id: self.order_id, customer_id: self.customer_id.clone(),
        }));
        true
    }

    pub fn submit_proof(&mut self, actor: &Actor, image: impl Into<String>, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if actor.is_admin() || actor.user_id != self.customer_id { return Err(PaymentError::NotOwner); }
        self.ensure_pending(now)?;
        self.proof_image = Some(image.into());
        self.proof_submitted_at = Some(now);
        self.updated_at = now;
        self.raise_event(DomainEvent::Payment(PaymentEvent::ProofSubmitted {
            payment_id: self.id, order_id: self.order_id, customer_id: self.customer_id.clone(),
        }));
        Ok(())
    }

    /// On `Err(Expired)` the payment itself has been moved to `Expired` and must still be saved.
    pub fn confirm(&mut self, admin: &Actor, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if !admin.is_admin() { return Err(PaymentError::AdminOnly); }
        self.ensure_pending(now)?;
        if self.proof_image.is_none() { return Err(PaymentError::MissingProof); }
        self.status = PaymentStatus::Confirmed;
        self.confirmed_by = Some(admin.user_id.clone());
        self.confirmed_at = Some(now);
        self.updated_at = now;
        self.raise_event(DomainEvent::Payment(PaymentEvent::Confirmed {
            payment_id: self.id, order_id: self.order_id, customer_id: self.customer_id.clone(),
            confirmed_by: admin.user_id.clone(),
        }));
        Ok(())
    }

    pub fn reject(&mut self, admin: &Actor, reason: impl Into<String>, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if !admin.is_admin() { return Err(PaymentError::AdminOnly); }
        self.ensure_pending(now)?;
        self.close_rejected(reason.into(), now);
        Ok(())
    }

    /// Withdraws a pending payment whose order went away, regardless of the window.
    pub fn void(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> bool {
        if self.status != PaymentStatus::Pending { return false; }
        self.close_rejected(reason.into(), now);
        true
    }

    fn close_rejected(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = PaymentStatus::Rejected;
        self.rejection_reason = Some(reason.clone());
        self.updated_at = now;
        self.raise_event(DomainEvent::Payment(PaymentEvent::Rejected {
            payment_id: self.id, order_id: self.order_id, customer_id: self.customer_id.clone(), reason,
        }));
    }

    fn ensure_pending(&mut self, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if self.refresh_expiry(now) { return Err(PaymentError::Expired(self.expired_at)); }
        match self.status {
            PaymentStatus::Pending => Ok(()),
            PaymentStatus::Expired => Err(PaymentError::Expired(self.expired_at)),
            other => Err(PaymentError::AlreadySettled(other)),
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment expired at {0}")]
    Expired(DateTime<Utc>),
    #[error("Payment is already {0}")]
    AlreadySettled(PaymentStatus),
    #[error("No proof of payment has been uploaded")]
    MissingProof,
    #[error("Payment belongs to another customer")]
    NotOwner,
    #[error("Only an admin can review payments")]
    AdminOnly,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Address, LineItem};
    use rust_decimal::Decimal;

    fn payment(now: DateTime<Utc>) -> Payment {
        let items = vec![LineItem::new(Uuid::nil(), "Kopi", 1, Money::idr(Decimal::new(50_000, 0)))];
        let order = Order::place("ORD-1", "CUST001", items, Address::default(), PaymentMethod::BankTransfer, now).unwrap();
        Payment::open(&order, order.total().clone(), Duration::minutes(5), now)
    }

    #[test]
    fn test_open_sets_window() {
        let now = Utc::now();
        let p = payment(now);
        assert_eq!(p.status(), PaymentStatus::Pending);
        assert_eq!(p.expired_at(), now + Duration::minutes(5));
        assert!(p.is_active_at(now + Duration::minutes(5)));
        assert!(!p.is_active_at(now + Duration::minutes(5) + Duration::seconds(1)));
    }

    #[test]
    fn test_confirm_within_window() {
        let now = Utc::now();
        let mut p = payment(now);
        let admin = Actor::admin("ADM1");
        assert_eq!(p.confirm(&admin, now), Err(PaymentError::MissingProof));
        p.submit_proof(&Actor::customer("CUST001"), "https://cdn.example/proof.jpg", now + Duration::minutes(1)).unwrap();
        p.confirm(&admin, now + Duration::minutes(4)).unwrap();
        assert_eq!(p.status(), PaymentStatus::Confirmed);
        assert_eq!(p.confirmed_by(), Some("ADM1"));
        assert_eq!(p.confirm(&admin, now), Err(PaymentError::AlreadySettled(PaymentStatus::Confirmed)));
    }

    #[test]
    fn test_expiry_is_lazy() {
        let now = Utc::now();
        let mut p = payment(now);
        p.submit_proof(&Actor::customer("CUST001"), "https://cdn.example/proof.jpg", now).unwrap();
        let late = now + Duration::minutes(6);
        let deadline = p.expired_at();
        assert_eq!(p.status(), PaymentStatus::Pending);
        assert_eq!(p.confirm(&Actor::admin("ADM1"), late), Err(PaymentError::Expired(deadline)));
        assert_eq!(p.status(), PaymentStatus::Expired);
        let events = p.take_events();
        assert!(matches!(events.last(), Some(DomainEvent::Payment(PaymentEvent::Expired { .. }))));
    }

    #[test]
    fn test_proof_owner_only() {
        let now = Utc::now();
        let mut p = payment(now);
        assert_eq!(p.submit_proof(&Actor::customer("X"), "u", now), Err(PaymentError::NotOwner));
        assert_eq!(p.reject(&Actor::customer("CUST001"), "r", now), Err(PaymentError::AdminOnly));
    }

    #[test]
    fn test_void_only_pending() {
        let now = Utc::now();
        let mut p = payment(now);
        assert!(p.void("order cancelled", now));
        assert_eq!(p.status(), PaymentStatus::Rejected);
        assert!(!p.void("again", now));
    }
}
