//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::LineItem;
use crate::domain::value_objects::{Money, IDR};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cart {
    customer_id: String,
    items: Vec<CartItem>,
    subtotal: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// `unit_price` is the product price at the moment the item was added.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

impl Cart {
    pub fn for_customer(customer_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self { customer_id: customer_id.into(), items: vec![], subtotal: Money::zero(IDR), created_at: now, updated_at: now }
    }

    pub fn customer_id(&self) -> &str { &self.customer_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn add_item(&mut self, item: CartItem, now: DateTime<Utc>) -> Result<(), CartError> {
        if item.quantity == 0 { return Err(CartError::InvalidQuantity); }
        if !self.items.is_empty() && item.unit_price.currency() != self.subtotal.currency() {
            return Err(CartError::CurrencyMismatch);
        }
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
        self.recalculate(now);
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid, now: DateTime<Utc>) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.recalculate(now);
        Ok(())
    }

    pub fn to_line_items(&self) -> Vec<LineItem> {
        self.items.iter().map(|i| LineItem::new(i.product_id, i.name.clone(), i.quantity, i.unit_price.clone())).collect()
    }

    fn recalculate(&mut self, now: DateTime<Utc>) {
        let currency = self.items.first().map(|i| i.unit_price.currency().to_string())
            .unwrap_or_else(|| self.subtotal.currency().to_string());
        self.subtotal = self.items.iter().fold(Money::zero(&currency), |acc, i| acc.add(&i.line_total()).unwrap_or(acc));
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("Item not found in cart")]
    ItemNotFound,
    #[error("Quantity must be at least one")]
    InvalidQuantity,
    #[error("Cart items must share one currency")]
    CurrencyMismatch,
}
