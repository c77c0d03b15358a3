use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::dto::AddToCartRequest;
use super::extract::{ApiJson, ApiPath};
use super::{AppState, AuthUser};
use crate::domain::aggregates::Cart;
use crate::error::AppResult;

pub async fn show(State(s): State<AppState>, AuthUser(actor): AuthUser) -> AppResult<Json<Cart>> {
    Ok(Json(s.storefront.cart(&actor).await?))
}

pub async fn add_item(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiJson(r): ApiJson<AddToCartRequest>) -> AppResult<(StatusCode, Json<Cart>)> {
    r.validate()?;
    let cart = s.storefront.add_to_cart(&actor, r.product_id, r.quantity).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

pub async fn remove_item(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(product_id): ApiPath<Uuid>) -> AppResult<Json<Cart>> {
    Ok(Json(s.storefront.remove_from_cart(&actor, product_id).await?))
}

pub async fn clear(State(s): State<AppState>, AuthUser(actor): AuthUser) -> AppResult<StatusCode> {
    s.storefront.clear_cart(&actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
