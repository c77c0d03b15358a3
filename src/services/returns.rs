use uuid::Uuid;

use super::Storefront;
use crate::domain::aggregates::Order;
use crate::domain::value_objects::Actor;
use crate::error::AppResult;

impl Storefront {
    pub async fn request_return(&self, actor: &Actor, id: Uuid, reason: String, images: Vec<String>) -> AppResult<Order> {
        let now = self.clock.now();
        let mut order = self.load_order(id).await?;
        order.request_return(actor, reason, images, now)?;
        self.commit_order(&mut order).await?;
        tracing::info!(order_id = %id, %actor, "return requested");
        Ok(order)
    }

    pub async fn review_return(&self, actor: &Actor, id: Uuid, approve: bool, note: Option<String>) -> AppResult<Order> {
        let now = self.clock.now();
        let mut order = self.load_order(id).await?;
        order.review_return(actor, approve, note, now)?;
        self.commit_order(&mut order).await?;
        tracing::info!(order_id = %id, %actor, approve, "return reviewed");
        Ok(order)
    }

    pub async fn ship_return(&self, actor: &Actor, id: Uuid, tracking_number: String) -> AppResult<Order> {
        let now = self.clock.now();
        let mut order = self.load_order(id).await?;
        order.ship_return(actor, tracking_number, now)?;
        self.commit_order(&mut order).await?;
        tracing::info!(order_id = %id, %actor, "return shipped back");
        Ok(order)
    }

    /// Returned goods go back into stock.
    pub async fn receive_return(&self, actor: &Actor, id: Uuid) -> AppResult<Order> {
        let now = self.clock.now();
        let mut order = self.load_order(id).await?;
        order.receive_return(actor, now)?;
        self.commit_order(&mut order).await?;
        let lines: Vec<(Uuid, u32)> = order.items().iter().map(|l| (l.product_id, l.quantity)).collect();
        self.release_stock(&lines).await;
        tracing::info!(order_id = %id, %actor, items = lines.len(), "return received and restocked");
        Ok(order)
    }
}
