//! Storefront lifecycle service: orders, manual transfer payments, returns and support chat.

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_lifecycle::{
    http::AuthKeys, router, AppState, Config, Notifier, PaymentSettings, Repositories, Storefront, SupportHub, SystemClock,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    let config = Config::from_env()?;

    let repos = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(10).connect(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Repositories::postgres(db)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory and lost on restart");
            Repositories::in_memory()
        }
    };

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, %url, "NATS unavailable, lifecycle events stay local");
                None
            }
        },
        None => None,
    };

    let notifier = Notifier::new(nats, SupportHub::default());
    let storefront = Storefront::new(repos, Arc::new(SystemClock), notifier, PaymentSettings::from(&config));
    let app = router(AppState::new(storefront, AuthKeys::new(&config.jwt_secret)));

    tracing::info!(
        payment_expiry_secs = config.payment_expiry.num_seconds(),
        "🚀 Storefront lifecycle listening on 0.0.0.0:{}",
        config.port
    );
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}
