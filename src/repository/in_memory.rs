use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CartRepository, OrderFilter, OrderRepository, PaymentRepository, ProductRepository, RepoError, RepoResult};
use crate::domain::aggregates::{Cart, Order, Payment, Product};

#[derive(Default)]
pub struct InMemoryOrderRepo { orders: RwLock<HashMap<Uuid, Order>> }

#[derive(Default)]
pub struct InMemoryPaymentRepo { payments: RwLock<HashMap<Uuid, Payment>> }

#[derive(Default)]
pub struct InMemoryProductRepo { products: RwLock<HashMap<Uuid, Product>> }

#[derive(Default)]
pub struct InMemoryCartRepo { carts: RwLock<HashMap<String, Cart>> }

#[async_trait]
impl OrderRepository for InMemoryOrderRepo {
    async fn insert(&self, order: &Order) -> RepoResult<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) { return Err(RepoError::Duplicate(order.id())); }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn update(&self, order: &mut Order) -> RepoResult<()> {
        let mut orders = self.orders.write().await;
        let stored = orders.get(&order.id()).ok_or(RepoError::NotFound(order.id()))?;
        if stored.version() != order.version() {
            return Err(RepoError::Conflict { id: order.id(), expected: order.version() });
        }
        order.set_version(order.version() + 1);
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &OrderFilter) -> RepoResult<(Vec<Order>, u64)> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders.values()
            .filter(|o| filter.customer_id.as_deref().map_or(true, |c| o.customer_id() == c))
            .filter(|o| filter.status.map_or(true, |s| o.status() == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| b.id().cmp(&a.id())));
        let total = matching.len() as u64;
        let page = matching.into_iter().skip(filter.offset as usize).take(filter.limit as usize).collect();
        Ok((page, total))
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepo {
    async fn insert(&self, payment: &Payment) -> RepoResult<()> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.id()) { return Err(RepoError::Duplicate(payment.id())); }
        payments.insert(payment.id(), payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &mut Payment) -> RepoResult<()> {
        let mut payments = self.payments.write().await;
        let stored = payments.get(&payment.id()).ok_or(RepoError::NotFound(payment.id()))?;
        if stored.version() != payment.version() {
            return Err(RepoError::Conflict { id: payment.id(), expected: payment.version() });
        }
        payment.set_version(payment.version() + 1);
        payments.insert(payment.id(), payment.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Payment>> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn list_for_order(&self, order_id: Uuid) -> RepoResult<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut found: Vec<Payment> = payments.values().filter(|p| p.order_id() == order_id).cloned().collect();
        found.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(&b.id())));
        Ok(found)
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepo {
    async fn find(&self, id: Uuid) -> RepoResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn save(&self, product: &Product) -> RepoResult<()> {
        self.products.write().await.insert(product.id(), product.clone());
        Ok(())
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepo {
    async fn find(&self, customer_id: &str) -> RepoResult<Option<Cart>> {
        Ok(self.carts.read().await.get(customer_id).cloned())
    }

    async fn save(&self, cart: &Cart) -> RepoResult<()> {
        self.carts.write().await.insert(cart.customer_id().to_string(), cart.clone());
        Ok(())
    }

    async fn delete(&self, customer_id: &str) -> RepoResult<()> {
        self.carts.write().await.remove(customer_id);
        Ok(())
    }
}
