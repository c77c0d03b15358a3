//! Value Objects for the storefront lifecycle

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const USD: &str = "USD";
pub const IDR: &str = "IDR";

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_uppercase() } }
    pub fn usd(amount: Decimal) -> Self { Self::new(amount, USD) }
    pub fn idr(amount: Decimal) -> Self { Self::new(amount, IDR) }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }
}

impl Default for Money { fn default() -> Self { Self::zero(IDR) } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.amount, self.currency) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { CurrencyMismatch, UnsupportedCurrency(String) }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrencyMismatch => write!(f, "Currency mismatch"),
            Self::UnsupportedCurrency(c) => write!(f, "Unsupported currency {c}"),
        }
    }
}

/// Fixed IDR/USD rate used to price a payment in the currency its method settles in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExchangeRate { idr_per_usd: Decimal }

impl ExchangeRate {
    pub fn new(idr_per_usd: Decimal) -> Self { Self { idr_per_usd } }

    pub fn convert(&self, money: &Money, to: &str) -> Result<Money, MoneyError> {
        let to = to.to_uppercase();
        let amount = match (money.currency(), to.as_str()) {
            (from, target) if from == target => money.amount(),
            (IDR, USD) => money.amount() / self.idr_per_usd,
            (USD, IDR) => money.amount() * self.idr_per_usd,
            (IDR, other) | (USD, other) => return Err(MoneyError::UnsupportedCurrency(other.to_string())),
            (other, _) => return Err(MoneyError::UnsupportedCurrency(other.to_string())),
        };
        Ok(Money::new(round_for(amount, &to), &to))
    }
}

fn round_for(amount: Decimal, currency: &str) -> Decimal {
    let dp = if currency == IDR { 0 } else { 2 };
    amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Quantity value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    pub fn subtract(&self, other: u32) -> Option<Self> {
        if other > self.0 { None } else { Some(Self(self.0 - other)) }
    }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

impl Default for Quantity { fn default() -> Self { Self(0) } }

/// How the customer settles an order. The method decides the payment currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { CreditCard, BankTransfer }

impl PaymentMethod {
    pub fn currency(&self) -> &'static str {
        match self { Self::CreditCard => USD, Self::BankTransfer => IDR }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role { Customer, Admin }

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Customer => "customer", Self::Admin => "admin" }
    }
}

/// Whoever triggers a state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor { pub user_id: String, pub role: Role }

impl Actor {
    pub fn customer(user_id: impl Into<String>) -> Self { Self { user_id: user_id.into(), role: Role::Customer } }
    pub fn admin(user_id: impl Into<String>) -> Self { Self { user_id: user_id.into(), role: Role::Admin } }
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
    /// Admins act on any resource, customers only on their own.
    pub fn may_access(&self, owner_id: &str) -> bool { self.is_admin() || self.user_id == owner_id }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}:{}", self.role.as_str(), self.user_id) }
}
