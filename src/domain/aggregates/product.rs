//! Product Aggregate
//!
//! Only the slice of a catalog product the lifecycle needs: its price for the
//! cart snapshot and its stock, reserved at checkout and released again when an
//! order is cancelled or a return arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{Money, Quantity};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    id: Uuid,
    name: String,
    price: Money,
    stock: Quantity,
    status: ProductStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus { #[default] Active, Archived }

impl Product {
    pub fn create(name: impl Into<String>, price: Money, stock: u32, now: DateTime<Utc>) -> Self {
        Self { id: Uuid::now_v7(), name: name.into(), price, stock: Quantity::new(stock), status: ProductStatus::Active, updated_at: now }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn price(&self) -> &Money { &self.price }
    pub fn stock(&self) -> &Quantity { &self.stock }
    pub fn status(&self) -> ProductStatus { self.status }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_available(&self) -> bool { self.status == ProductStatus::Active && !self.stock.is_zero() }

    pub fn reserve(&mut self, qty: u32, now: DateTime<Utc>) -> Result<(), ProductError> {
        if self.status != ProductStatus::Active { return Err(ProductError::Unavailable); }
        self.stock = self.stock.subtract(qty).ok_or(ProductError::InsufficientStock { requested: qty, available: self.stock.value() })?;
        self.updated_at = now;
        Ok(())
    }

    pub fn release(&mut self, qty: u32, now: DateTime<Utc>) {
        self.stock = self.stock.add(qty);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("Product is not available")]
    Unavailable,
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
}
