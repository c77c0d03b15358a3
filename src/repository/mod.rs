//! Persistence seams for the lifecycle aggregates.
//!
//! Orders and payments are updated optimistically: `update` only succeeds when
//! the stored version equals the aggregate's version, and bumps it on success.
//! No transaction spans more than one aggregate.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Order, Payment, Product};
use crate::domain::lifecycle::OrderStatus;

mod in_memory;
mod postgres;

pub use in_memory::{InMemoryCartRepo, InMemoryOrderRepo, InMemoryPaymentRepo, InMemoryProductRepo};
pub use postgres::{PgCartRepo, PgOrderRepo, PgPaymentRepo, PgProductRepo};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record {0} not found")]
    NotFound(Uuid),
    #[error("record {id} was modified concurrently (expected version {expected})")]
    Conflict { id: Uuid, expected: u64 },
    #[error("duplicate record {0}")]
    Duplicate(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type RepoResult<T> = std::result::Result<T, RepoError>;

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub limit: u32,
    pub offset: u32,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> RepoResult<()>;
    async fn update(&self, order: &mut Order) -> RepoResult<()>;
    async fn find(&self, id: Uuid) -> RepoResult<Option<Order>>;
    /// Newest first.
    async fn list(&self, filter: &OrderFilter) -> RepoResult<(Vec<Order>, u64)>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert(&self, payment: &Payment) -> RepoResult<()>;
    async fn update(&self, payment: &mut Payment) -> RepoResult<()>;
    async fn find(&self, id: Uuid) -> RepoResult<Option<Payment>>;
    /// Oldest first.
    async fn list_for_order(&self, order_id: Uuid) -> RepoResult<Vec<Payment>>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> RepoResult<Option<Product>>;
    async fn save(&self, product: &Product) -> RepoResult<()>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find(&self, customer_id: &str) -> RepoResult<Option<Cart>>;
    async fn save(&self, cart: &Cart) -> RepoResult<()>;
    async fn delete(&self, customer_id: &str) -> RepoResult<()>;
}

#[derive(Clone)]
pub struct Repositories {
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(InMemoryOrderRepo::default()),
            payments: Arc::new(InMemoryPaymentRepo::default()),
            products: Arc::new(InMemoryProductRepo::default()),
            carts: Arc::new(InMemoryCartRepo::default()),
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            orders: Arc::new(PgOrderRepo::new(pool.clone())),
            payments: Arc::new(PgPaymentRepo::new(pool.clone())),
            products: Arc::new(PgProductRepo::new(pool.clone())),
            carts: Arc::new(PgCartRepo::new(pool)),
        }
    }
}
