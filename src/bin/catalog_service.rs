//! catalog-service: item catalog with the product-request responder
//!
//! ## Architecture
//! ```text
//! [identity-service] --product_request--> [broker] --> [responder] --> [items db]
//!                                                          |
//! [identity-service] <--product_response-- [broker] <------+
//! ```
//!
//! ## Configuration
//! - BRIDGE_CONFIG: optional YAML file (defaults to ./config.yaml if present)
//! - BRIDGE__SERVER__CATALOG_PORT: HTTP port (default: 5001)
//! - BRIDGE__MESSAGING__AMQP__URL: RabbitMQ URL
//! - BRIDGE__CATALOG__IDENTITY_URL: identity service base URL for `/users`

use tracing::info;

use profile_bridge::bus::{init_broker, BusError};
use profile_bridge::catalog::{http, CatalogContext};
use profile_bridge::config::Config;
use profile_bridge::storage::init_item_store;
use profile_bridge::utils::bootstrap::{
    connect_with_retry, init_tracing, serve, shutdown_signal,
};

const BROKER_CONNECT_ATTEMPTS: u32 = 30;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let config = Config::load(None)?;
    let addr = config.server.catalog_addr()?;

    let items = init_item_store(&config.storage).await?;
    let broker = connect_with_retry(
        "broker",
        BROKER_CONNECT_ATTEMPTS,
        || init_broker(&config.messaging),
        BusError::is_retryable,
    )
    .await?;

    let ctx = CatalogContext::new(items, broker, config.catalog.identity_url.clone());
    let responder = ctx.responder().spawn().await?;

    info!(addr = %addr, "catalog-service started");
    serve("catalog", http::router(ctx), addr, shutdown_signal()).await?;

    responder.abort();
    info!("catalog-service stopped");
    Ok(())
}
