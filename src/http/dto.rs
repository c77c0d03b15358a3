use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::aggregates::{Address, Order, Payment};
use crate::domain::lifecycle::OrderStatus;
use crate::domain::value_objects::PaymentMethod;

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 999))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 120))]
    pub recipient: String,
    #[validate(length(min = 6, max = 20))]
    pub phone: String,
    #[validate(length(min = 1, max = 255))]
    pub street: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(max = 100))]
    pub province: Option<String>,
    #[validate(length(min = 3, max = 10))]
    pub postal_code: String,
    #[validate(length(min = 2, max = 56))]
    pub country: String,
}

impl From<AddressRequest> for Address {
    fn from(r: AddressRequest) -> Self {
        Self { recipient: r.recipient, phone: r.phone, street: r.street, city: r.city, province: r.province, postal_code: r.postal_code, country: r.country }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate]
    pub shipping_address: AddressRequest,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CancelRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExpeditionRequest {
    #[validate(length(min = 1, max = 60))]
    pub service: String,
    #[validate(length(min = 3, max = 60))]
    pub tracking_number: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
    #[validate]
    pub expedition: Option<ExpeditionRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProofRequest {
    #[validate(url)]
    pub proof_image: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectPaymentRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReturnRequestBody {
    #[validate(length(min = 5, max = 1000))]
    pub reason: String,
    #[serde(default)]
    #[validate(length(max = 5), custom = "validate_image_urls")]
    pub images: Vec<String>,
}

fn validate_image_urls(images: &[String]) -> Result<(), ValidationError> {
    if images.iter().all(|u| validator::validate_url(u.as_str())) { Ok(()) } else { Err(ValidationError::new("image_url")) }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewReturnRequest {
    pub approve: bool,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShipReturnRequest {
    #[validate(length(min = 3, max = 60))]
    pub tracking_number: String,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SupportMessageRequest {
    pub room: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct SupportSocketQuery {
    pub room: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> { pub data: Vec<T>, pub total: u64, pub page: u32 }

/// An order together with the statuses it may move to next.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub next_states: Vec<OrderStatus>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let next_states = order.status().next_states();
        Self { order, next_states }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentReviewResponse {
    pub payment: Payment,
    pub order: OrderView,
}

#[derive(Debug, Serialize)]
pub struct SupportMessageResponse {
    pub room: String,
    pub delivered: usize,
    pub bot_reply: Option<&'static str>,
}
