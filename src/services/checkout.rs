use uuid::Uuid;

use super::Storefront;
use crate::domain::aggregates::{Address, Cart, CartItem, Order, ProductError};
use crate::domain::value_objects::{Actor, PaymentMethod};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
}

impl Storefront {
    pub async fn cart(&self, actor: &Actor) -> AppResult<Cart> {
        Ok(self.repos.carts.find(&actor.user_id).await?.unwrap_or_else(|| Cart::for_customer(&actor.user_id, self.clock.now())))
    }

    pub async fn add_to_cart(&self, actor: &Actor, product_id: Uuid, quantity: u32) -> AppResult<Cart> {
        let product = self.repos.products.find(product_id).await?.ok_or(AppError::NotFound("product"))?;
        if !product.is_available() { return Err(ProductError::Unavailable.into()); }
        let mut cart = self.cart(actor).await?;
        cart.add_item(CartItem { product_id, name: product.name().to_string(), quantity, unit_price: product.price().clone() }, self.clock.now())?;
        self.repos.carts.save(&cart).await?;
        Ok(cart)
    }

    pub async fn remove_from_cart(&self, actor: &Actor, product_id: Uuid) -> AppResult<Cart> {
        let mut cart = self.cart(actor).await?;
        cart.remove_item(product_id, self.clock.now())?;
        self.repos.carts.save(&cart).await?;
        Ok(cart)
    }

    pub async fn clear_cart(&self, actor: &Actor) -> AppResult<()> {
        self.repos.carts.delete(&actor.user_id).await?;
        Ok(())
    }

    /// Turns the actor's cart into an order. Stock is reserved line by line before the order is
    /// written; if any step fails the reservations made so far are handed back.
    pub async fn checkout(&self, actor: &Actor, input: CheckoutInput) -> AppResult<Order> {
        let cart = self.repos.carts.find(&actor.user_id).await?
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Validation("cart is empty".to_string()))?;
        let now = self.clock.now();
        let order_number = format!("ORD-{:08}", rand::random::<u32>());
        let mut order = Order::place(order_number, &actor.user_id, cart.to_line_items(), input.shipping_address, input.payment_method, now)?;

        let mut reserved = Vec::with_capacity(order.items().len());
        for line in order.items() {
            if let Err(e) = self.reserve_stock(line.product_id, line.quantity).await {
                self.release_stock(&reserved).await;
                return Err(e);
            }
            reserved.push((line.product_id, line.quantity));
        }
        if let Err(e) = self.repos.orders.insert(&order).await {
            self.release_stock(&reserved).await;
            return Err(e.into());
        }
        if let Err(e) = self.repos.carts.delete(&actor.user_id).await {
            tracing::warn!(order_id = %order.id(), error = %e, "order placed but cart was not cleared");
        }
        tracing::info!(order_id = %order.id(), order_number = order.order_number(), customer_id = %actor.user_id, total = %order.total(), "order placed");
        self.notifier.publish(order.take_events(), now).await;
        Ok(order)
    }

    async fn reserve_stock(&self, product_id: Uuid, quantity: u32) -> AppResult<()> {
        let mut product = self.repos.products.find(product_id).await?.ok_or(AppError::NotFound("product"))?;
        product.reserve(quantity, self.clock.now())?;
        self.repos.products.save(&product).await?;
        Ok(())
    }

    /// Compensation path, so failures are only logged.
    pub(super) async fn release_stock(&self, lines: &[(Uuid, u32)]) {
        for &(product_id, quantity) in lines {
            match self.repos.products.find(product_id).await {
                Ok(Some(mut product)) => {
                    product.release(quantity, self.clock.now());
                    if let Err(e) = self.repos.products.save(&product).await {
                        tracing::warn!(%product_id, quantity, error = %e, "stock release failed");
                    }
                }
                Ok(None) => tracing::warn!(%product_id, quantity, "stock release skipped, product is gone"),
                Err(e) => tracing::warn!(%product_id, quantity, error = %e, "stock release failed"),
            }
        }
    }
}
