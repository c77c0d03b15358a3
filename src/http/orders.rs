use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::dto::{
    CancelRequest, CheckoutRequest, ListOrdersQuery, OrderView, PaginatedResponse, ReturnRequestBody, ReviewReturnRequest,
    ShipReturnRequest, StatusUpdateRequest,
};
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::{AdminUser, AppState, AuthUser};
use crate::error::AppResult;
use crate::services::{CheckoutInput, ExpeditionInput};

pub async fn list(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiQuery(q): ApiQuery<ListOrdersQuery>) -> AppResult<Json<PaginatedResponse<OrderView>>> {
    let page = q.page.unwrap_or(1).max(1);
    let per_page = q.per_page.unwrap_or(20);
    let (orders, total) = s.storefront.list_orders(&actor, q.status, page, per_page).await?;
    Ok(Json(PaginatedResponse { data: orders.into_iter().map(OrderView::from).collect(), total, page }))
}

pub async fn checkout(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiJson(r): ApiJson<CheckoutRequest>) -> AppResult<(StatusCode, Json<OrderView>)> {
    r.validate()?;
    let input = CheckoutInput { shipping_address: r.shipping_address.into(), payment_method: r.payment_method };
    let order = s.storefront.checkout(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

pub async fn show(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(id): ApiPath<Uuid>) -> AppResult<Json<OrderView>> {
    Ok(Json(s.storefront.order(&actor, id).await?.into()))
}

pub async fn cancel(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(id): ApiPath<Uuid>, ApiJson(r): ApiJson<CancelRequest>) -> AppResult<Json<OrderView>> {
    r.validate()?;
    Ok(Json(s.storefront.cancel_order(&actor, id, r.reason).await?.into()))
}

pub async fn accept(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(id): ApiPath<Uuid>) -> AppResult<Json<OrderView>> {
    Ok(Json(s.storefront.accept_order(&actor, id).await?.into()))
}

pub async fn request_return(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(id): ApiPath<Uuid>, ApiJson(r): ApiJson<ReturnRequestBody>) -> AppResult<(StatusCode, Json<OrderView>)> {
    r.validate()?;
    let order = s.storefront.request_return(&actor, id, r.reason, r.images).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

pub async fn ship_return(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(id): ApiPath<Uuid>, ApiJson(r): ApiJson<ShipReturnRequest>) -> AppResult<Json<OrderView>> {
    r.validate()?;
    Ok(Json(s.storefront.ship_return(&actor, id, r.tracking_number).await?.into()))
}

pub async fn update_status(State(s): State<AppState>, AdminUser(actor): AdminUser, ApiPath(id): ApiPath<Uuid>, ApiJson(r): ApiJson<StatusUpdateRequest>) -> AppResult<Json<OrderView>> {
    r.validate()?;
    let expedition = r.expedition.map(|e| ExpeditionInput { service: e.service, tracking_number: e.tracking_number });
    Ok(Json(s.storefront.advance_order(&actor, id, r.status, expedition).await?.into()))
}

pub async fn review_return(State(s): State<AppState>, AdminUser(actor): AdminUser, ApiPath(id): ApiPath<Uuid>, ApiJson(r): ApiJson<ReviewReturnRequest>) -> AppResult<Json<OrderView>> {
    r.validate()?;
    Ok(Json(s.storefront.review_return(&actor, id, r.approve, r.note).await?.into()))
}

pub async fn receive_return(State(s): State<AppState>, AdminUser(actor): AdminUser, ApiPath(id): ApiPath<Uuid>) -> AppResult<Json<OrderView>> {
    Ok(Json(s.storefront.receive_return(&actor, id).await?.into()))
}
