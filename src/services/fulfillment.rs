use uuid::Uuid;

use super::Storefront;
use crate::domain::aggregates::Order;
use crate::domain::lifecycle::OrderStatus;
use crate::domain::value_objects::Actor;
use crate::error::{AppError, AppResult};
use crate::repository::OrderFilter;

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct ExpeditionInput {
    pub service: String,
    pub tracking_number: String,
}

impl Storefront {
    /// Customers only ever see their own orders.
    pub async fn list_orders(&self, actor: &Actor, status: Option<OrderStatus>, page: u32, per_page: u32) -> AppResult<(Vec<Order>, u64)> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        let filter = OrderFilter {
            customer_id: (!actor.is_admin()).then(|| actor.user_id.clone()),
            status,
            limit: per_page,
            offset: (page - 1).saturating_mul(per_page),
        };
        Ok(self.repos.orders.list(&filter).await?)
    }

    pub async fn order(&self, actor: &Actor, id: Uuid) -> AppResult<Order> {
        let order = self.load_order(id).await?;
        order.ensure_access(actor)?;
        Ok(order)
    }

    /// Admin-driven fulfilment moves. Cancellation goes through [`Storefront::cancel_order`] so that
    /// stock and payments are unwound; the return sub-flow has its own operations.
    pub async fn advance_order(&self, actor: &Actor, id: Uuid, to: OrderStatus, expedition: Option<ExpeditionInput>) -> AppResult<Order> {
        if !actor.is_admin() { return Err(AppError::Forbidden("admin only".to_string())); }
        if to == OrderStatus::Cancelled {
            return self.cancel_order(actor, id, "cancelled by admin".to_string()).await;
        }
        if to.is_return_flow() {
            return Err(AppError::Validation(format!("{to} is handled by the return endpoints")));
        }
        let now = self.clock.now();
        let mut order = self.load_order(id).await?;
        let from = order.status();
        if let Some(e) = expedition {
            order.attach_expedition(e.service, e.tracking_number, now)?;
        }
        order.transition(to, actor, now)?;
        self.commit_order(&mut order).await?;
        tracing::info!(order_id = %id, %from, %to, %actor, "order status changed");
        Ok(order)
    }

    pub async fn cancel_order(&self, actor: &Actor, id: Uuid, reason: String) -> AppResult<Order> {
        let now = self.clock.now();
        let mut order = self.load_order(id).await?;
        let from = order.status();
        order.cancel(actor, reason, now)?;
        self.commit_order(&mut order).await?;
        tracing::info!(order_id = %id, %from, %actor, "order cancelled");

        let lines: Vec<(Uuid, u32)> = order.items().iter().map(|l| (l.product_id, l.quantity)).collect();
        self.release_stock(&lines).await;
        for mut payment in self.repos.payments.list_for_order(id).await? {
            if payment.refresh_expiry(now) {
                self.commit_payment(&mut payment).await?;
                tracing::info!(order_id = %id, payment_id = %payment.id(), "payment expired");
            } else if payment.void("order cancelled", now) {
                self.commit_payment(&mut payment).await?;
                tracing::info!(order_id = %id, payment_id = %payment.id(), "pending payment voided");
            }
        }
        Ok(order)
    }

    pub async fn accept_order(&self, actor: &Actor, id: Uuid) -> AppResult<Order> {
        let now = self.clock.now();
        let mut order = self.load_order(id).await?;
        order.accept(actor, now)?;
        self.commit_order(&mut order).await?;
        tracing::info!(order_id = %id, %actor, "order accepted");
        Ok(order)
    }
}
