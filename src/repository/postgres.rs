//! Postgres repositories. Aggregates are stored whole as JSONB documents, with
//! the columns the service filters on kept alongside.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CartRepository, OrderFilter, OrderRepository, PaymentRepository, ProductRepository, RepoError, RepoResult};
use crate::domain::aggregates::{Cart, Order, Payment, Product};

const UNIQUE_VIOLATION: &str = "23505";

fn insert_error(id: Uuid, e: sqlx::Error) -> RepoError {
    let duplicate = e.as_database_error().and_then(|d| d.code()).is_some_and(|c| c == UNIQUE_VIOLATION);
    if duplicate { RepoError::Duplicate(id) } else { RepoError::Database(e) }
}

#[derive(Clone)] pub struct PgOrderRepo { pool: PgPool }
#[derive(Clone)] pub struct PgPaymentRepo { pool: PgPool }
#[derive(Clone)] pub struct PgProductRepo { pool: PgPool }
#[derive(Clone)] pub struct PgCartRepo { pool: PgPool }

impl PgOrderRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }
impl PgPaymentRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }
impl PgProductRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }
impl PgCartRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }

#[async_trait]
impl OrderRepository for PgOrderRepo {
    async fn insert(&self, order: &Order) -> RepoResult<()> {
        sqlx::query("INSERT INTO orders (id, customer_id, status, version, document, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(order.id()).bind(order.customer_id()).bind(order.status().as_str()).bind(order.version() as i64)
            .bind(Json(order)).bind(order.created_at()).bind(order.updated_at())
            .execute(&self.pool).await.map_err(|e| insert_error(order.id(), e))?;
        Ok(())
    }

    async fn update(&self, order: &mut Order) -> RepoResult<()> {
        let expected = order.version();
        order.set_version(expected + 1);
        let result = sqlx::query("UPDATE orders SET status = $2, version = $3, document = $4, updated_at = $5 WHERE id = $1 AND version = $6")
            .bind(order.id()).bind(order.status().as_str()).bind((expected + 1) as i64)
            .bind(Json(&*order)).bind(order.updated_at()).bind(expected as i64)
            .execute(&self.pool).await;
        match result {
            Ok(done) if done.rows_affected() == 1 => Ok(()),
            Ok(_) => { order.set_version(expected); Err(RepoError::Conflict { id: order.id(), expected }) }
            Err(e) => { order.set_version(expected); Err(e.into()) }
        }
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Order>> {
        let row = sqlx::query_as::<_, (Json<Order>,)>("SELECT document FROM orders WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(|(Json(order),)| order))
    }

    async fn list(&self, filter: &OrderFilter) -> RepoResult<(Vec<Order>, u64)> {
        let customer = filter.customer_id.as_deref();
        let status = filter.status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, (Json<Order>,)>("SELECT document FROM orders WHERE ($1::text IS NULL OR customer_id = $1) AND ($2::text IS NULL OR status = $2) ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4")
            .bind(customer).bind(status).bind(filter.limit as i64).bind(filter.offset as i64)
            .fetch_all(&self.pool).await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR customer_id = $1) AND ($2::text IS NULL OR status = $2)")
            .bind(customer).bind(status).fetch_one(&self.pool).await?;
        Ok((rows.into_iter().map(|(Json(o),)| o).collect(), total.0.max(0) as u64))
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepo {
    async fn insert(&self, payment: &Payment) -> RepoResult<()> {
        sqlx::query("INSERT INTO payments (id, order_id, status, version, document, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(payment.id()).bind(payment.order_id()).bind(payment.status().as_str()).bind(payment.version() as i64)
            .bind(Json(payment)).bind(payment.created_at())
            .execute(&self.pool).await.map_err(|e| insert_error(payment.id(), e))?;
        Ok(())
    }

    async fn update(&self, payment: &mut Payment) -> RepoResult<()> {
        let expected = payment.version();
        payment.set_version(expected + 1);
        let result = sqlx::query("UPDATE payments SET status = $2, version = $3, document = $4 WHERE id = $1 AND version = $5")
            .bind(payment.id()).bind(payment.status().as_str()).bind((expected + 1) as i64)
            .bind(Json(&*payment)).bind(expected as i64)
            .execute(&self.pool).await;
        match result {
            Ok(done) if done.rows_affected() == 1 => Ok(()),
            Ok(_) => { payment.set_version(expected); Err(RepoError::Conflict { id: payment.id(), expected }) }
            Err(e) => { payment.set_version(expected); Err(e.into()) }
        }
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Payment>> {
        let row = sqlx::query_as::<_, (Json<Payment>,)>("SELECT document FROM payments WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(|(Json(payment),)| payment))
    }

    async fn list_for_order(&self, order_id: Uuid) -> RepoResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, (Json<Payment>,)>("SELECT document FROM payments WHERE order_id = $1 ORDER BY created_at, id")
            .bind(order_id).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(Json(p),)| p).collect())
    }
}

#[async_trait]
impl ProductRepository for PgProductRepo {
    async fn find(&self, id: Uuid) -> RepoResult<Option<Product>> {
        let row = sqlx::query_as::<_, (Json<Product>,)>("SELECT document FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(|(Json(product),)| product))
    }

    async fn save(&self, product: &Product) -> RepoResult<()> {
        sqlx::query("INSERT INTO products (id, document, updated_at) VALUES ($1, $2, NOW()) ON CONFLICT (id) DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()")
            .bind(product.id()).bind(Json(product)).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CartRepository for PgCartRepo {
    async fn find(&self, customer_id: &str) -> RepoResult<Option<Cart>> {
        let row = sqlx::query_as::<_, (Json<Cart>,)>("SELECT document FROM carts WHERE customer_id = $1")
            .bind(customer_id).fetch_optional(&self.pool).await?;
        Ok(row.map(|(Json(cart),)| cart))
    }

    async fn save(&self, cart: &Cart) -> RepoResult<()> {
        sqlx::query("INSERT INTO carts (customer_id, document, updated_at) VALUES ($1, $2, NOW()) ON CONFLICT (customer_id) DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()")
            .bind(cart.customer_id()).bind(Json(cart)).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete(&self, customer_id: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM carts WHERE customer_id = $1").bind(customer_id).execute(&self.pool).await?;
        Ok(())
    }
}
