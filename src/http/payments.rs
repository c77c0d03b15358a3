use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::dto::{PaymentReviewResponse, ProofRequest, RejectPaymentRequest};
use super::extract::{ApiJson, ApiPath};
use super::{AdminUser, AppState, AuthUser};
use crate::domain::aggregates::Payment;
use crate::error::AppResult;

pub async fn list(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(order_id): ApiPath<Uuid>) -> AppResult<Json<Vec<Payment>>> {
    Ok(Json(s.storefront.payments_for_order(&actor, order_id).await?))
}

pub async fn open(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(order_id): ApiPath<Uuid>) -> AppResult<(StatusCode, Json<Payment>)> {
    let payment = s.storefront.open_payment(&actor, order_id).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn submit_proof(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(id): ApiPath<Uuid>, ApiJson(r): ApiJson<ProofRequest>) -> AppResult<Json<Payment>> {
    r.validate()?;
    Ok(Json(s.storefront.submit_proof(&actor, id, r.proof_image).await?))
}

pub async fn confirm(State(s): State<AppState>, AdminUser(actor): AdminUser, ApiPath(id): ApiPath<Uuid>) -> AppResult<Json<PaymentReviewResponse>> {
    let (payment, order) = s.storefront.confirm_payment(&actor, id).await?;
    Ok(Json(PaymentReviewResponse { payment, order: order.into() }))
}

pub async fn reject(State(s): State<AppState>, AdminUser(actor): AdminUser, ApiPath(id): ApiPath<Uuid>, ApiJson(r): ApiJson<RejectPaymentRequest>) -> AppResult<Json<PaymentReviewResponse>> {
    r.validate()?;
    let (payment, order) = s.storefront.reject_payment(&actor, id, r.reason).await?;
    Ok(Json(PaymentReviewResponse { payment, order: order.into() }))
}
