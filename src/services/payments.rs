use uuid::Uuid;

use super::Storefront;
use crate::domain::aggregates::{Order, Payment, PaymentError};
use crate::domain::lifecycle::{OrderStatus, PaymentStatus};
use crate::domain::value_objects::Actor;
use crate::error::{AppError, AppResult};

impl Storefront {
    /// Opens the payment the customer settles by transfer. Older payments of the order are
    /// expiry-checked first; one that is still pending and inside its window blocks a new one.
    pub async fn open_payment(&self, actor: &Actor, order_id: Uuid) -> AppResult<Payment> {
        let now = self.clock.now();
        let mut order = self.load_order(order_id).await?;
        if actor.user_id != order.customer_id() {
            return Err(AppError::Forbidden("only the customer who placed the order can pay for it".to_string()));
        }
        if order.is_paid() { return Err(AppError::Conflict("order is already paid".to_string())); }
        if order.status() != OrderStatus::Processing {
            return Err(AppError::Conflict(format!("order is {}, payments are only accepted while processing", order.status())));
        }
        for mut previous in self.repos.payments.list_for_order(order_id).await? {
            if previous.refresh_expiry(now) {
                self.commit_payment(&mut previous).await?;
                tracing::info!(%order_id, payment_id = %previous.id(), "payment expired");
            } else if previous.is_active_at(now) {
                return Err(AppError::Conflict(format!("payment {} is open until {}", previous.id(), previous.expired_at())));
            }
        }

        let amount = self.payments.exchange.convert(order.total(), order.payment_method().currency())?;
        let mut payment = Payment::open(&order, amount, self.payments.expiry, now);
        self.repos.payments.insert(&payment).await?;
        if order.payment_status() != PaymentStatus::Pending {
            order.record_payment(PaymentStatus::Pending, now);
            self.commit_order(&mut order).await?;
        }
        tracing::info!(%order_id, payment_id = %payment.id(), amount = %payment.amount(), expired_at = %payment.expired_at(), "payment opened");
        self.notifier.publish(payment.take_events(), now).await;
        Ok(payment)
    }

    pub async fn payments_for_order(&self, actor: &Actor, order_id: Uuid) -> AppResult<Vec<Payment>> {
        self.load_order(order_id).await?.ensure_access(actor)?;
        Ok(self.repos.payments.list_for_order(order_id).await?)
    }

    pub async fn submit_proof(&self, actor: &Actor, payment_id: Uuid, proof_image: String) -> AppResult<Payment> {
        let now = self.clock.now();
        let mut payment = self.load_payment(payment_id).await?;
        let outcome = payment.submit_proof(actor, proof_image, now);
        self.settle(&mut payment, outcome).await?;
        tracing::info!(%payment_id, order_id = %payment.order_id(), "proof of payment submitted");
        Ok(payment)
    }

    /// Admin review. A confirmed payment moves a processing order to `confirmed`.
    pub async fn confirm_payment(&self, actor: &Actor, payment_id: Uuid) -> AppResult<(Payment, Order)> {
        if !actor.is_admin() { return Err(PaymentError::AdminOnly.into()); }
        let now = self.clock.now();
        let mut payment = self.load_payment(payment_id).await?;
        let outcome = payment.confirm(actor, now);
        self.settle(&mut payment, outcome).await?;
        tracing::info!(%payment_id, order_id = %payment.order_id(), %actor, "payment confirmed");
        let order = self.mirror_payment(&payment, actor).await?;
        Ok((payment, order))
    }

    pub async fn reject_payment(&self, actor: &Actor, payment_id: Uuid, reason: String) -> AppResult<(Payment, Order)> {
        if !actor.is_admin() { return Err(PaymentError::AdminOnly.into()); }
        let now = self.clock.now();
        let mut payment = self.load_payment(payment_id).await?;
        let outcome = payment.reject(actor, reason, now);
        self.settle(&mut payment, outcome).await?;
        tracing::info!(%payment_id, order_id = %payment.order_id(), %actor, "payment rejected");
        let order = self.mirror_payment(&payment, actor).await?;
        Ok((payment, order))
    }

    /// Persists the result of a payment operation. An operation that found the payment past its
    /// window still writes the `expired` state and mirrors it onto the order before failing.
    async fn settle(&self, payment: &mut Payment, outcome: Result<(), PaymentError>) -> AppResult<()> {
        match outcome {
            Ok(()) => self.commit_payment(payment).await,
            Err(PaymentError::Expired(at)) => {
                if payment.status() == PaymentStatus::Expired {
                    let events = payment.take_events();
                    if !events.is_empty() {
                        self.repos.payments.update(payment).await?;
                        self.notifier.publish(events, self.clock.now()).await;
                        tracing::info!(payment_id = %payment.id(), order_id = %payment.order_id(), "payment expired");
                        let mut order = self.load_order(payment.order_id()).await?;
                        order.record_payment(PaymentStatus::Expired, self.clock.now());
                        self.commit_order(&mut order).await?;
                    }
                }
                Err(PaymentError::Expired(at).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mirror_payment(&self, payment: &Payment, actor: &Actor) -> AppResult<Order> {
        let now = self.clock.now();
        let mut order = self.load_order(payment.order_id()).await?;
        order.record_payment(payment.status(), now);
        if payment.status() == PaymentStatus::Confirmed && order.status() == OrderStatus::Processing {
            order.transition(OrderStatus::Confirmed, actor, now)?;
            tracing::info!(order_id = %order.id(), from = %OrderStatus::Processing, to = %OrderStatus::Confirmed, %actor, "order status changed");
        }
        self.commit_order(&mut order).await?;
        Ok(order)
    }
}
