//! bridge-standalone: both services in one process
//!
//! Identity and catalog share an in-process channel broker, so no RabbitMQ
//! is needed. Each service keeps its own database file and port.
//!
//! ## Configuration
//! Same sources as the individual services. `messaging` is ignored.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use profile_bridge::bus::{ChannelBroker, DeliveryMode, QueueBroker};
use profile_bridge::catalog::{self, CatalogContext};
use profile_bridge::config::Config;
use profile_bridge::identity::{self, IdentityContext, TokenIssuer};
use profile_bridge::storage::{init_account_store, init_item_store};
use profile_bridge::utils::bootstrap::{init_tracing, serve, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let config = Config::load(None)?;
    let catalog_addr = config.server.catalog_addr()?;
    let identity_addr = config.server.identity_addr()?;
    let tokens = TokenIssuer::from_config(&config.auth)?;

    let broker: Arc<dyn QueueBroker> = Arc::new(ChannelBroker::new(DeliveryMode::Queued));
    let items = init_item_store(&config.storage).await?;
    let accounts = init_account_store(&config.storage).await?;

    let catalog_ctx = CatalogContext::new(
        items,
        Arc::clone(&broker),
        format!("http://127.0.0.1:{}", config.server.identity_port),
    );
    let identity_ctx = IdentityContext::new(accounts, broker, tokens);

    let responder = catalog_ctx.responder().spawn().await?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let stopped = |mut rx: watch::Receiver<bool>| async move {
        let _ = rx.wait_for(|stop| *stop).await;
    };

    info!(%catalog_addr, %identity_addr, "bridge-standalone started");

    let catalog = serve(
        "catalog",
        catalog::http::router(catalog_ctx),
        catalog_addr,
        stopped(stop_rx.clone()),
    );
    let identity = serve(
        "identity",
        identity::http::router(identity_ctx),
        identity_addr,
        stopped(stop_rx),
    );
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    let result = tokio::try_join!(catalog, identity);
    responder.abort();
    result?;

    info!("bridge-standalone stopped");
    Ok(())
}
