use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_lifecycle::domain::aggregates::Product;
use storefront_lifecycle::domain::value_objects::{ExchangeRate, Money, Role};
use storefront_lifecycle::http::{AuthKeys, Claims};
use storefront_lifecycle::{
    router, AppState, Clock, ManualClock, Notifier, PaymentSettings, Repositories, Storefront, SupportHub,
};

const SECRET: &str = "test-secret";

struct TestApp {
    app: Router,
    clock: Arc<ManualClock>,
    repos: Repositories,
}

impl TestApp {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let repos = Repositories::in_memory();
        let settings = PaymentSettings { expiry: Duration::seconds(300), exchange: ExchangeRate::new(Decimal::from(16_000)) };
        let storefront = Storefront::new(
            repos.clone(),
            clock.clone() as Arc<dyn Clock>,
            Notifier::new(None, SupportHub::default()),
            settings,
        );
        let app = router(AppState::new(storefront, AuthKeys::new(SECRET)));
        Self { app, clock, repos }
    }

    async fn seed_product(&self, price: i64, stock: u32) -> Uuid {
        let product = Product::create("Batik shirt", Money::idr(Decimal::from(price)), stock, self.clock.now());
        self.repos.products.save(&product).await.unwrap();
        product.id()
    }

    async fn stock_of(&self, id: Uuid) -> u32 {
        self.repos.products.find(id).await.unwrap().unwrap().stock().value()
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    /// Fills the customer's cart and checks out; returns the order id.
    async fn place_order(&self, token: &str, product_id: Uuid, quantity: u32) -> Uuid {
        let (status, _) = self.call(Method::POST, "/api/v1/cart/items", Some(token), Some(json!({"product_id": product_id, "quantity": quantity}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, order) = self.call(Method::POST, "/api/v1/orders", Some(token), Some(checkout_body())).await;
        assert_eq!(status, StatusCode::CREATED, "{order}");
        assert_eq!(order["status"], "processing");
        order["id"].as_str().unwrap().parse().unwrap()
    }

    async fn open_payment(&self, token: &str, order_id: Uuid) -> Uuid {
        let (status, payment) = self.call(Method::POST, &format!("/api/v1/orders/{order_id}/payments"), Some(token), None).await;
        assert_eq!(status, StatusCode::CREATED, "{payment}");
        payment["id"].as_str().unwrap().parse().unwrap()
    }

    async fn set_status(&self, order_id: Uuid, body: Value) -> (StatusCode, Value) {
        self.call(Method::PATCH, &format!("/api/v1/admin/orders/{order_id}/status"), Some(&admin()), Some(body)).await
    }

    async fn submit_proof(&self, token: &str, payment_id: Uuid) {
        let (status, body) = self.call(Method::POST, &format!("/api/v1/payments/{payment_id}/proof"), Some(token),
            Some(json!({"proof_image": "https://cdn.example.com/proofs/transfer.jpg"}))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    /// Pays, ships and delivers the order, then has the customer accept it.
    async fn deliver_and_accept(&self, token: &str, order_id: Uuid) {
        let payment_id = self.open_payment(token, order_id).await;
        self.submit_proof(token, payment_id).await;
        let (status, _) = self.call(Method::POST, &format!("/api/v1/admin/payments/{payment_id}/confirm"), Some(&admin()), None).await;
        assert_eq!(status, StatusCode::OK);
        for body in [
            json!({"status": "being_packed"}),
            json!({"status": "managed_by_expedition", "expedition": {"service": "JNE", "tracking_number": "JNE777000"}}),
            json!({"status": "shipped"}),
            json!({"status": "delivered"}),
        ] {
            let (status, order) = self.set_status(order_id, body).await;
            assert_eq!(status, StatusCode::OK, "{order}");
        }
        let (status, _) = self.call(Method::POST, &format!("/api/v1/orders/{order_id}/accept"), Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

fn token(sub: &str, role: Role) -> String {
    let claims = Claims { sub: sub.to_string(), role, exp: (Utc::now().timestamp() + 3600) as usize };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn customer(id: &str) -> String { token(id, Role::Customer) }
fn admin() -> String { token("ADMIN-1", Role::Admin) }

fn checkout_body() -> Value {
    json!({
        "shipping_address": {
            "recipient": "Siti Rahma", "phone": "081234567890", "street": "Jl. Merdeka 10",
            "city": "Bandung", "province": "Jawa Barat", "postal_code": "40111", "country": "ID"
        },
        "payment_method": "bank_transfer"
    })
}

#[tokio::test]
async fn test_health() {
    let t = TestApp::new();
    let (status, body) = t.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_full_lifecycle_with_return() {
    let t = TestApp::new();
    let cust = customer("CUST-1");
    let product = t.seed_product(150_000, 5).await;
    let order_id = t.place_order(&cust, product, 2).await;
    assert_eq!(t.stock_of(product).await, 3);

    let (_, cart) = t.call(Method::GET, "/api/v1/cart", Some(&cust), None).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    let payment_id = t.open_payment(&cust, order_id).await;
    let (status, body) = t.call(Method::POST, &format!("/api/v1/admin/payments/{payment_id}/confirm"), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "confirming without proof: {body}");

    let (status, payment) = t.call(Method::POST, &format!("/api/v1/payments/{payment_id}/proof"), Some(&cust),
        Some(json!({"proof_image": "https://cdn.example.com/proofs/1.jpg"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["amount"]["currency"], "IDR");

    let (status, review) = t.call(Method::POST, &format!("/api/v1/admin/payments/{payment_id}/confirm"), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK, "{review}");
    assert_eq!(review["payment"]["status"], "confirmed");
    assert_eq!(review["order"]["status"], "confirmed");
    assert_eq!(review["order"]["payment_status"], "confirmed");

    let (status, _) = t.set_status(order_id, json!({"status": "being_packed"})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.set_status(order_id, json!({"status": "managed_by_expedition"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, order) = t.set_status(order_id, json!({
        "status": "managed_by_expedition", "expedition": {"service": "JNE", "tracking_number": "JNE123456"}
    })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["expedition"]["tracking_number"], "JNE123456");

    let (status, body) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/cancel"), Some(&cust), Some(json!({"reason": "too slow"}))).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    for next in ["shipped", "delivered"] {
        let (status, order) = t.set_status(order_id, json!({"status": next})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["status"], next);
    }

    let (status, order) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/accept"), Some(&cust), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "accepted");
    assert_eq!(order["next_states"], json!(["return_requested"]));

    let (status, order) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/return"), Some(&cust),
        Some(json!({"reason": "wrong size delivered", "images": ["https://cdn.example.com/returns/1.jpg"]}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "return_requested");

    let (status, order) = t.call(Method::POST, &format!("/api/v1/admin/orders/{order_id}/return/review"), Some(&admin()),
        Some(json!({"approve": true, "note": "send it back"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "return_approved");

    let (status, order) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/return/ship"), Some(&cust),
        Some(json!({"tracking_number": "SICEPAT99"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "return_shipped");

    let (status, order) = t.call(Method::POST, &format!("/api/v1/admin/orders/{order_id}/return/receive"), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "return_received");
    assert_eq!(order["next_states"], json!([]));
    assert_eq!(t.stock_of(product).await, 5);

    let history = order["history"].as_array().unwrap();
    assert_eq!(history.len(), 10);
}

#[tokio::test]
async fn test_payment_expires_after_window() {
    let t = TestApp::new();
    let cust = customer("CUST-2");
    let product = t.seed_product(99_000, 10).await;
    let order_id = t.place_order(&cust, product, 1).await;
    let first = t.open_payment(&cust, order_id).await;

    let (status, _) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/payments"), Some(&cust), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    t.clock.advance(Duration::seconds(301));
    let (status, body) = t.call(Method::POST, &format!("/api/v1/payments/{first}/proof"), Some(&cust),
        Some(json!({"proof_image": "https://cdn.example.com/late.jpg"}))).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], "gone");

    let (_, payments) = t.call(Method::GET, &format!("/api/v1/orders/{order_id}/payments"), Some(&cust), None).await;
    assert_eq!(payments[0]["status"], "expired");
    let (_, order) = t.call(Method::GET, &format!("/api/v1/orders/{order_id}"), Some(&cust), None).await;
    assert_eq!(order["payment_status"], "expired");
    assert_eq!(order["status"], "processing");

    let second = t.open_payment(&cust, order_id).await;
    assert_ne!(first, second);
    let (_, order) = t.call(Method::GET, &format!("/api/v1/orders/{order_id}"), Some(&cust), None).await;
    assert_eq!(order["payment_status"], "pending");
}

#[tokio::test]
async fn test_late_confirmation_is_refused() {
    let t = TestApp::new();
    let cust = customer("CUST-3");
    let product = t.seed_product(50_000, 2).await;
    let order_id = t.place_order(&cust, product, 1).await;
    let payment_id = t.open_payment(&cust, order_id).await;
    let (status, _) = t.call(Method::POST, &format!("/api/v1/payments/{payment_id}/proof"), Some(&cust),
        Some(json!({"proof_image": "https://cdn.example.com/ok.jpg"}))).await;
    assert_eq!(status, StatusCode::OK);

    t.clock.advance(Duration::minutes(6));
    let (status, _) = t.call(Method::POST, &format!("/api/v1/admin/payments/{payment_id}/confirm"), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::GONE);
    let (_, order) = t.call(Method::GET, &format!("/api/v1/orders/{order_id}"), Some(&admin()), None).await;
    assert_eq!(order["status"], "processing");
}

#[tokio::test]
async fn test_cancellation_releases_stock_and_voids_payment() {
    let t = TestApp::new();
    let cust = customer("CUST-4");
    let product = t.seed_product(75_000, 4).await;
    let order_id = t.place_order(&cust, product, 3).await;
    assert_eq!(t.stock_of(product).await, 1);
    t.open_payment(&cust, order_id).await;

    let (status, order) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/cancel"), Some(&cust), Some(json!({"reason": "changed my mind"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");
    assert_eq!(t.stock_of(product).await, 4);

    let (_, payments) = t.call(Method::GET, &format!("/api/v1/orders/{order_id}/payments"), Some(&cust), None).await;
    assert_eq!(payments[0]["status"], "rejected");

    let (status, _) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/cancel"), Some(&cust), Some(json!({"reason": "again"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = t.set_status(order_id, json!({"status": "confirmed"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_checkout_beyond_stock_is_refused() {
    let t = TestApp::new();
    let cust = customer("CUST-5");
    let product = t.seed_product(10_000, 1).await;
    let (status, _) = t.call(Method::POST, "/api/v1/cart/items", Some(&cust), Some(json!({"product_id": product, "quantity": 2}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = t.call(Method::POST, "/api/v1/orders", Some(&cust), Some(checkout_body())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(t.stock_of(product).await, 1);

    let (status, _) = t.call(Method::POST, "/api/v1/orders", Some(&customer("CUST-EMPTY")), Some(checkout_body())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_permissions() {
    let t = TestApp::new();
    let owner = customer("CUST-6");
    let product = t.seed_product(20_000, 3).await;
    let order_id = t.place_order(&owner, product, 1).await;

    let (status, body) = t.call(Method::GET, &format!("/api/v1/orders/{order_id}"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
    let (status, _) = t.call(Method::GET, "/api/v1/orders", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stranger = customer("CUST-7");
    let (status, _) = t.call(Method::GET, &format!("/api/v1/orders/{order_id}"), Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/payments"), Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.call(Method::PATCH, &format!("/api/v1/admin/orders/{order_id}/status"), Some(&owner), Some(json!({"status": "confirmed"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t.set_status(order_id, json!({"status": "confirmed"})).await;
    assert_eq!(status, StatusCode::CONFLICT, "unpaid order cannot be confirmed: {body}");

    let (_, listing) = t.call(Method::GET, "/api/v1/orders", Some(&stranger), None).await;
    assert_eq!(listing["total"], 0);
    let (_, listing) = t.call(Method::GET, "/api/v1/orders?status=processing", Some(&admin()), None).await;
    assert_eq!(listing["total"], 1);

    let (status, _) = t.call(Method::GET, &format!("/api/v1/orders/{}", Uuid::now_v7()), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_support_message_gets_bot_reply() {
    let t = TestApp::new();
    let cust = customer("CUST-8");
    let (status, body) = t.call(Method::POST, "/api/v1/support/messages", Some(&cust), Some(json!({"body": "Where is my tracking number?"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room"], "support:CUST-8");
    assert!(body["bot_reply"].is_string());

    let (status, _) = t.call(Method::POST, "/api/v1/support/messages", Some(&cust), Some(json!({"room": "support:CUST-9", "body": "hi"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rejected_payment_can_be_retried() {
    let t = TestApp::new();
    let cust = customer("CUST-10");
    let product = t.seed_product(40_000, 3).await;
    let order_id = t.place_order(&cust, product, 1).await;
    let first = t.open_payment(&cust, order_id).await;
    t.submit_proof(&cust, first).await;

    let (status, review) = t.call(Method::POST, &format!("/api/v1/admin/payments/{first}/reject"), Some(&admin()),
        Some(json!({"reason": "transfer amount does not match"}))).await;
    assert_eq!(status, StatusCode::OK, "{review}");
    assert_eq!(review["payment"]["status"], "rejected");
    assert_eq!(review["order"]["payment_status"], "rejected");
    assert_eq!(review["order"]["status"], "processing");

    let (status, _) = t.call(Method::POST, &format!("/api/v1/admin/payments/{first}/confirm"), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let second = t.open_payment(&cust, order_id).await;
    t.submit_proof(&cust, second).await;
    let (status, review) = t.call(Method::POST, &format!("/api/v1/admin/payments/{second}/confirm"), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["order"]["status"], "confirmed");
    assert_eq!(review["order"]["payment_status"], "confirmed");
}

#[tokio::test]
async fn test_rejected_return_is_terminal() {
    let t = TestApp::new();
    let cust = customer("CUST-11");
    let product = t.seed_product(60_000, 2).await;
    let order_id = t.place_order(&cust, product, 1).await;
    t.deliver_and_accept(&cust, order_id).await;

    let return_body = json!({"reason": "colour differs from photo"});
    let (status, _) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/return"), Some(&cust), Some(return_body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, order) = t.call(Method::POST, &format!("/api/v1/admin/orders/{order_id}/return/review"), Some(&admin()),
        Some(json!({"approve": false, "note": "matches the listing"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "return_rejected");
    assert_eq!(order["next_states"], json!([]));
    assert_eq!(order["return_request"]["review_note"], "matches the listing");

    let (status, _) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/return/ship"), Some(&cust),
        Some(json!({"tracking_number": "SICEPAT01"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/return"), Some(&cust), Some(return_body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(t.stock_of(product).await, 1);
}

#[tokio::test]
async fn test_admin_cancels_through_status_update() {
    let t = TestApp::new();
    let cust = customer("CUST-12");
    let product = t.seed_product(30_000, 5).await;
    let order_id = t.place_order(&cust, product, 2).await;
    assert_eq!(t.stock_of(product).await, 3);

    let (status, order) = t.set_status(order_id, json!({"status": "cancelled"})).await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["status"], "cancelled");
    assert_eq!(order["cancellation"]["cancelled_by"], "admin:ADMIN-1");
    assert_eq!(t.stock_of(product).await, 5);
}

#[tokio::test]
async fn test_return_statuses_are_not_set_directly() {
    let t = TestApp::new();
    let cust = customer("CUST-13");
    let product = t.seed_product(30_000, 5).await;
    let order_id = t.place_order(&cust, product, 1).await;
    t.deliver_and_accept(&cust, order_id).await;

    for target in ["return_requested", "return_approved", "return_received"] {
        let (status, body) = t.set_status(order_id, json!({"status": target})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{target}: {body}");
    }
    let (_, order) = t.call(Method::GET, &format!("/api/v1/orders/{order_id}"), Some(&cust), None).await;
    assert_eq!(order["status"], "accepted");
}

#[tokio::test]
async fn test_cancel_marks_lapsed_payment_expired() {
    let t = TestApp::new();
    let cust = customer("CUST-14");
    let product = t.seed_product(30_000, 5).await;
    let order_id = t.place_order(&cust, product, 1).await;
    t.open_payment(&cust, order_id).await;
    t.clock.advance(Duration::seconds(400));

    let (status, _) = t.call(Method::POST, &format!("/api/v1/orders/{order_id}/cancel"), Some(&cust), Some(json!({"reason": "forgot to pay"}))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, payments) = t.call(Method::GET, &format!("/api/v1/orders/{order_id}/payments"), Some(&cust), None).await;
    assert_eq!(payments[0]["status"], "expired");
}

#[tokio::test]
async fn test_query_token_is_refused_outside_the_socket() {
    let t = TestApp::new();
    let (status, body) = t.call(Method::GET, &format!("/api/v1/orders?access_token={}", customer("CUST-15")), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn test_malformed_requests_answer_with_json_errors() {
    let t = TestApp::new();
    let cust = customer("CUST-16");
    let product = t.seed_product(30_000, 5).await;
    let order_id = t.place_order(&cust, product, 1).await;

    let (status, body) = t.set_status(order_id, json!({"status": "on_hold"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_failed");
    assert!(body["message"].as_str().unwrap().contains("on_hold"));

    let (status, body) = t.call(Method::GET, "/api/v1/orders/not-a-uuid", Some(&cust), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = t.call(Method::GET, "/api/v1/orders?status=on_hold", Some(&cust), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_failed");
}
