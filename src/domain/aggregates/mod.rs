//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod payment;

pub use product::{Product, ProductError, ProductStatus};
pub use order::{Order, OrderError, LineItem, Address, Expedition, ReturnRequest, Cancellation, StatusChange};
pub use cart::{Cart, CartError, CartItem};
pub use payment::{Payment, PaymentError};
