//! identity-service: accounts, access tokens and the profile query
//!
//! `GET /profile` publishes the caller's id on `product_request` and takes
//! one message off `product_response` without waiting.
//!
//! ## Configuration
//! - BRIDGE_CONFIG: optional YAML file (defaults to ./config.yaml if present)
//! - BRIDGE__SERVER__IDENTITY_PORT: HTTP port (default: 5000)
//! - BRIDGE__MESSAGING__AMQP__URL: RabbitMQ URL
//! - BRIDGE__AUTH__SECRET: token signing secret (required)

use tracing::info;

use profile_bridge::bus::{init_broker, BusError};
use profile_bridge::config::Config;
use profile_bridge::identity::{http, IdentityContext, TokenIssuer};
use profile_bridge::storage::init_account_store;
use profile_bridge::utils::bootstrap::{
    connect_with_retry, init_tracing, serve, shutdown_signal,
};

const BROKER_CONNECT_ATTEMPTS: u32 = 30;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let config = Config::load(None)?;
    let addr = config.server.identity_addr()?;
    let tokens = TokenIssuer::from_config(&config.auth)?;

    let accounts = init_account_store(&config.storage).await?;
    let broker = connect_with_retry(
        "broker",
        BROKER_CONNECT_ATTEMPTS,
        || init_broker(&config.messaging),
        BusError::is_retryable,
    )
    .await?;

    let ctx = IdentityContext::new(accounts, broker, tokens);

    info!(addr = %addr, "identity-service started");
    serve("identity", http::router(ctx), addr, shutdown_signal()).await?;

    info!("identity-service stopped");
    Ok(())
}
