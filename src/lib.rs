//! Storefront lifecycle service
//!
//! Back-office core of a self-hosted storefront: checkout from the cart,
//! manual bank-transfer payments reviewed by an admin, the order fulfilment
//! workflow and the return sub-flow.
//!
//! ## Features
//! - Single transition table for order statuses ([`domain::lifecycle`])
//! - Proof-of-payment review with a lazily enforced expiry window
//! - Returns: request, review, ship back, receive
//! - Support rooms with a keyword chatbot and order notifications
//! - Postgres or in-memory storage, optional NATS event publishing

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod notify;
pub mod repository;
pub mod services;
pub mod support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError};
pub use error::{AppError, AppResult};
pub use http::{router, AppState};
pub use notify::Notifier;
pub use repository::Repositories;
pub use services::{PaymentSettings, Storefront};
pub use support::SupportHub;
