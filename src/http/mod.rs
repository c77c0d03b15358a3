//! REST/JSON surface and the support WebSocket.

mod auth;
mod cart;
pub mod dto;
mod extract;
mod orders;
mod payments;
mod support;

use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::Storefront;

pub use auth::{AdminUser, AuthKeys, AuthUser, Claims, SocketUser};

#[derive(Clone)]
pub struct AppState {
    pub storefront: Arc<Storefront>,
    pub auth: Arc<AuthKeys>,
}

impl AppState {
    pub fn new(storefront: Storefront, auth: AuthKeys) -> Self {
        Self { storefront: Arc::new(storefront), auth: Arc::new(auth) }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add_item))
        .route("/cart/items/:product_id", delete(cart::remove_item))
        .route("/orders", get(orders::list).post(orders::checkout))
        .route("/orders/:id", get(orders::show))
        .route("/orders/:id/cancel", post(orders::cancel))
        .route("/orders/:id/accept", post(orders::accept))
        .route("/orders/:id/return", post(orders::request_return))
        .route("/orders/:id/return/ship", post(orders::ship_return))
        .route("/orders/:id/payments", get(payments::list).post(payments::open))
        .route("/payments/:id/proof", post(payments::submit_proof))
        .route("/admin/orders/:id/status", patch(orders::update_status))
        .route("/admin/orders/:id/return/review", post(orders::review_return))
        .route("/admin/orders/:id/return/receive", post(orders::receive_return))
        .route("/admin/payments/:id/confirm", post(payments::confirm))
        .route("/admin/payments/:id/reject", post(payments::reject))
        .route("/support/ws", get(support::socket))
        .route("/support/messages", post(support::post_message));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-lifecycle"})) }))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
