//! Process configuration read from the environment (`.env` is loaded by `main`).

use chrono::Duration;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_PAYMENT_EXPIRY_SECS: i64 = 300;
pub const DEFAULT_IDR_PER_USD: i64 = 16_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub jwt_secret: String,
    pub payment_expiry: Duration,
    pub idr_per_usd: Decimal,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so it can be exercised without touching the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let port = parse_or(&non_empty("PORT"), "PORT", DEFAULT_PORT)?;
        let expiry_secs = parse_or(&non_empty("PAYMENT_EXPIRY_SECS"), "PAYMENT_EXPIRY_SECS", DEFAULT_PAYMENT_EXPIRY_SECS)?;
        if expiry_secs <= 0 {
            return Err(ConfigError::Invalid { key: "PAYMENT_EXPIRY_SECS", value: expiry_secs.to_string() });
        }
        let idr_per_usd = parse_or(&non_empty("IDR_PER_USD"), "IDR_PER_USD", Decimal::from(DEFAULT_IDR_PER_USD))?;
        if idr_per_usd <= Decimal::ZERO {
            return Err(ConfigError::Invalid { key: "IDR_PER_USD", value: idr_per_usd.to_string() });
        }
        Ok(Self {
            port,
            database_url: non_empty("DATABASE_URL"),
            nats_url: non_empty("NATS_URL"),
            jwt_secret: non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            payment_expiry: Duration::seconds(expiry_secs),
            idr_per_usd,
        })
    }
}

fn parse_or<T: FromStr>(raw: &Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { key, value: v.clone() }),
    }
}
