//! Bootstrap utilities for the service binaries.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing from the BRIDGE_LOG environment variable.
///
/// Defaults to "info" level if BRIDGE_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run `connect` until it succeeds, backing off exponentially.
///
/// Gives up after `max_attempts`, or at the first error `retryable` rejects,
/// and returns that error.
pub async fn connect_with_retry<T, E, F, Fut, R>(
    target: &str,
    max_attempts: u32,
    connect: F,
    retryable: R,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    const INITIAL_DELAY: Duration = Duration::from_millis(100);
    const MAX_DELAY: Duration = Duration::from_secs(5);

    let mut delay = INITIAL_DELAY;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match connect().await {
            Ok(client) => {
                info!(target_name = %target, attempt, "Connected");
                return Ok(client);
            }
            Err(e) if attempt < max_attempts && retryable(&e) => {
                warn!(
                    target_name = %target,
                    attempt,
                    max_attempts,
                    error = %e,
                    retry_in = ?delay,
                    "Connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, MAX_DELAY);
            }
            Err(e) => {
                error!(target_name = %target, attempts = attempt, error = %e, "Giving up");
                return Err(e);
            }
        }
    }
}

/// Resolve on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Serve `app` on `addr` until `shutdown` resolves.
///
/// In-flight requests are allowed to finish.
pub async fn serve(
    name: &str,
    app: Router,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(service = %name, addr = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!(service = %name, "HTTP server stopped");
    Ok(())
}
