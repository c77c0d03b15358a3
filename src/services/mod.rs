//! Lifecycle operations. Each one loads the aggregates it needs, applies the
//! domain method, saves, then publishes the events the aggregate raised.

mod checkout;
mod fulfillment;
mod payments;
mod returns;

use chrono::{DateTime, Duration};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::Config;
use crate::domain::aggregates::{Order, Payment};
use crate::domain::value_objects::ExchangeRate;
use crate::error::{AppError, AppResult};
use crate::notify::Notifier;
use crate::repository::Repositories;
use crate::support::SupportHub;

pub use checkout::CheckoutInput;
pub use fulfillment::ExpeditionInput;

#[derive(Debug, Clone, Copy)]
pub struct PaymentSettings {
    pub expiry: Duration,
    pub exchange: ExchangeRate,
}

impl From<&Config> for PaymentSettings {
    fn from(config: &Config) -> Self {
        Self { expiry: config.payment_expiry, exchange: ExchangeRate::new(config.idr_per_usd) }
    }
}

pub struct Storefront {
    repos: Repositories,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    payments: PaymentSettings,
}

impl Storefront {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>, notifier: Notifier, payments: PaymentSettings) -> Self {
        Self { repos, clock, notifier, payments }
    }

    pub fn now(&self) -> DateTime<chrono::Utc> { self.clock.now() }
    pub fn hub(&self) -> &SupportHub { self.notifier.hub() }

    async fn load_order(&self, id: Uuid) -> AppResult<Order> {
        self.repos.orders.find(id).await?.ok_or(AppError::NotFound("order"))
    }

    async fn load_payment(&self, id: Uuid) -> AppResult<Payment> {
        self.repos.payments.find(id).await?.ok_or(AppError::NotFound("payment"))
    }

    async fn commit_order(&self, order: &mut Order) -> AppResult<()> {
        let events = order.take_events();
        self.repos.orders.update(order).await?;
        self.notifier.publish(events, self.clock.now()).await;
        Ok(())
    }

    async fn commit_payment(&self, payment: &mut Payment) -> AppResult<()> {
        let events = payment.take_events();
        self.repos.payments.update(payment).await?;
        self.notifier.publish(events, self.clock.now()).await;
        Ok(())
    }
}
