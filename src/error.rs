//! HTTP-facing error: a message plus the status code it is answered with.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domain::aggregates::{CartError, OrderError, PaymentError, ProductError};
use crate::domain::value_objects::MoneyError;
use crate::repository::RepoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("authentication required")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Gone(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Gone(_) => StatusCode::GONE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) => "validation_failed",
            Self::Conflict(_) => "conflict",
            Self::Gone(_) => "gone",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (self.status_code(), Json(json!({ "code": self.code(), "message": message }))).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotOwner | OrderError::RoleNotPermitted { .. } => Self::Forbidden(e.to_string()),
            OrderError::NoItems | OrderError::MixedCurrencies | OrderError::MissingExpedition | OrderError::MissingReturnRequest => {
                Self::Validation(e.to_string())
            }
            OrderError::InvalidTransition { .. } | OrderError::PaymentNotConfirmed | OrderError::ExpeditionLocked(_) => {
                Self::Conflict(e.to_string())
            }
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::Expired(_) => Self::Gone(e.to_string()),
            PaymentError::AlreadySettled(_) => Self::Conflict(e.to_string()),
            PaymentError::MissingProof => Self::Validation(e.to_string()),
            PaymentError::NotOwner | PaymentError::AdminOnly => Self::Forbidden(e.to_string()),
        }
    }
}

impl From<CartError> for AppError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ItemNotFound => Self::NotFound("cart item"),
            CartError::InvalidQuantity | CartError::CurrencyMismatch => Self::Validation(e.to_string()),
        }
    }
}

impl From<ProductError> for AppError {
    fn from(e: ProductError) -> Self { Self::Conflict(e.to_string()) }
}

impl From<MoneyError> for AppError {
    fn from(e: MoneyError) -> Self { Self::Internal(e.to_string()) }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(_) => Self::NotFound("record"),
            RepoError::Conflict { .. } => Self::Conflict("the record was changed by another request, reload and retry".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self { Self::Validation(e.body_text()) }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self { Self::Validation(e.body_text()) }
}

/// A path segment that does not parse cannot name an existing record.
impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        match e {
            PathRejection::FailedToDeserializePathParams(inner) => {
                tracing::debug!(error = %inner.body_text(), "unparseable path parameter");
                Self::NotFound("resource")
            }
            other => Self::Internal(other.body_text()),
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
