//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::lifecycle::{OrderStatus, PaymentStatus};
use crate::domain::value_objects::{Actor, Money, PaymentMethod};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    id: Uuid,
    order_number: String,
    customer_id: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    items: Vec<LineItem>,
    total: Money,
    shipping_address: Address,
    expedition: Option<Expedition>,
    return_request: Option<ReturnRequest>,
    cancellation: Option<Cancellation>,
    history: Vec<StatusChange>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)] pub struct LineItem { pub product_id: Uuid, pub name: String, pub quantity: u32, pub unit_price: Money, pub total: Money }
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)] pub struct Address { pub recipient: String, pub phone: String, pub street: String, pub city: String, pub province: Option<String>, pub postal_code: String, pub country: String }
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)] pub struct Expedition { pub service: String, pub tracking_number: String, pub assigned_at: DateTime<Utc> }
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)] pub struct Cancellation { pub reason: String, pub cancelled_by: String, pub cancelled_at: DateTime<Utc> }
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)] pub struct StatusChange { pub from: OrderStatus, pub to: OrderStatus, pub actor: String, pub at: DateTime<Utc> }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub reason: String,
    pub images: Vec<String>,
    pub requested_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_note: Option<String>,
    pub return_tracking_number: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
}

impl LineItem {
    pub fn new(product_id: Uuid, name: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        let total = unit_price.multiply(quantity);
        Self { product_id, name: name.into(), quantity, unit_price, total }
    }
}

impl Order {
    pub fn place(
        order_number: impl Into<String>, customer_id: impl Into<String>, items: Vec<LineItem>,
        shipping_address: Address, payment_method: PaymentMethod, now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        let first = items.first().ok_or(OrderError::NoItems)?;
        let currency = first.total.currency().to_string();
        let total = items.iter().try_fold(Money::zero(&currency), |acc, i| acc.add(&i.total))
            .map_err(|_| OrderError::MixedCurrencies)?;
        let mut order = Self {
            id: Uuid::now_v7(), order_number: order_number.into(), customer_id: customer_id.into(),
            status: OrderStatus::Processing, payment_status: PaymentStatus::Pending, payment_method,
            items, total, shipping_address, expedition: None, return_request: None, cancellation: None,
            history: vec![], version: 0, created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: order.id, customer_id: order.customer_id.clone(), total: order.total.clone(),
        }));
        Ok(order)
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_number(&self) -> &str { &self.order_number }
    pub fn customer_id(&self) -> &str { &self.customer_id }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn total(&self) -> &Money { &self.total }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn shipping_address(&self) -> &Address { &self.shipping_address }
    pub fn expedition(&self) -> Option<&Expedition> { self.expedition.as_ref() }
    pub fn return_request(&self) -> Option<&ReturnRequest> { self.return_request.as_ref() }
    pub fn cancellation(&self) -> Option<&Cancellation> { self.cancellation.as_ref() }
    pub fn history(&self) -> &[StatusChange] { &self.history }
    pub fn version(&self) -> u64 { self.version }
    pub fn set_version(&mut self, version: u64) { self.version = version; }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn ensure_access(&self, actor: &Actor) -> Result<(), OrderError> {
        if actor.may_access(&self.customer_id) { Ok(()) } else { Err(OrderError::NotOwner) }
    }

    /// Applies one move of the workflow after checking the transition table, the actor's role,
    /// ownership and the guards attached to the target state.
    pub fn transition(&mut self, to: OrderStatus, actor: &Actor, now: DateTime<Utc>) -> Result<(), OrderError> {
        let from = self.status;
        if !from.can_transition_to(to) { return Err(OrderError::InvalidTransition { from, to }); }
        if !from.permits(to, actor.role) { return Err(OrderError::RoleNotPermitted { to, role: actor.role.as_str() }); }
        self.ensure_access(actor)?;
        match to {
            OrderStatus::Confirmed if self.payment_status != PaymentStatus::Confirmed => return Err(OrderError::PaymentNotConfirmed),
            OrderStatus::ManagedByExpedition if self.expedition.is_none() => return Err(OrderError::MissingExpedition),
            OrderStatus::ReturnRequested if self.return_request.is_none() => return Err(OrderError::MissingReturnRequest),
            _ => {}
        }
        self.status = to;
        self.history.push(StatusChange { from, to, actor: actor.to_string(), at: now });
        self.touch(now);
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged {
            order_id: self.id, customer_id: self.customer_id.clone(), from, to, actor: actor.to_string(),
        }));
        Ok(())
    }

    /// Carrier details may be set or corrected until the parcel leaves with the carrier.
    pub fn attach_expedition(&mut self, service: impl Into<String>, tracking_number: impl Into<String>, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !matches!(self.status, OrderStatus::Confirmed | OrderStatus::BeingPacked | OrderStatus::ManagedByExpedition) {
            return Err(OrderError::ExpeditionLocked(self.status));
        }
        self.expedition = Some(Expedition { service: service.into(), tracking_number: tracking_number.into(), assigned_at: now });
        self.touch(now);
        Ok(())
    }

    pub fn cancel(&mut self, actor: &Actor, reason: impl Into<String>, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled, actor, now)?;
        self.cancellation = Some(Cancellation { reason: reason.into(), cancelled_by: actor.to_string(), cancelled_at: now });
        Ok(())
    }

    pub fn accept(&mut self, actor: &Actor, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.transition(OrderStatus::Accepted, actor, now)
    }

    pub fn request_return(&mut self, actor: &Actor, reason: impl Into<String>, images: Vec<String>, now: DateTime<Utc>) -> Result<(), OrderError> {
        let previous = self.return_request.replace(ReturnRequest {
            reason: reason.into(), images, requested_at: now, reviewed_at: None,
            review_note: None, return_tracking_number: None, received_at: None,
        });
        if let Err(e) = self.transition(OrderStatus::ReturnRequested, actor, now) {
            self.return_request = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn review_return(&mut self, actor: &Actor, approve: bool, note: Option<String>, now: DateTime<Utc>) -> Result<(), OrderError> {
        let to = if approve { OrderStatus::ReturnApproved } else { OrderStatus::ReturnRejected };
        self.transition(to, actor, now)?;
        if let Some(r) = self.return_request.as_mut() {
            r.reviewed_at = Some(now);
            r.review_note = note;
        }
        Ok(())
    }

    pub fn ship_return(&mut self, actor: &Actor, tracking_number: impl Into<String>, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.transition(OrderStatus::ReturnShipped, actor, now)?;
        if let Some(r) = self.return_request.as_mut() { r.return_tracking_number = Some(tracking_number.into()); }
        Ok(())
    }

    pub fn receive_return(&mut self, actor: &Actor, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.transition(OrderStatus::ReturnReceived, actor, now)?;
        if let Some(r) = self.return_request.as_mut() { r.received_at = Some(now); }
        Ok(())
    }

    /// Mirrors the outcome of the order's latest payment.
    pub fn record_payment(&mut self, status: PaymentStatus, now: DateTime<Utc>) {
        if self.payment_status != status {
            self.payment_status = status;
            self.touch(now);
        }
    }

    pub fn is_paid(&self) -> bool { self.payment_status == PaymentStatus::Confirmed }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self, now: DateTime<Utc>) { self.updated_at = now; }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Order has no items")]
    NoItems,
    #[error("Order items are priced in different currencies")]
    MixedCurrencies,
    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("A {role} may not move an order to {to}")]
    RoleNotPermitted { to: OrderStatus, role: &'static str },
    #[error("Order belongs to another customer")]
    NotOwner,
    #[error("Payment has not been confirmed")]
    PaymentNotConfirmed,
    #[error("Expedition details are required before handing over to the carrier")]
    MissingExpedition,
    #[error("Expedition cannot be changed while the order is {0}")]
    ExpeditionLocked(OrderStatus),
    #[error("Return request details are missing")]
    MissingReturnRequest,
}
