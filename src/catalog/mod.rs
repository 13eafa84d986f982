//! Catalog service.
//!
//! Owns the item store. Runs the product-request responder next to its HTTP
//! surface and proxies the identity service's user list.

pub mod http;
pub mod responder;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::bus::QueueBroker;
use crate::storage::ItemStore;

pub use responder::{CatalogResponder, ResponderError};

/// Errors from catalog collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
}

/// Shared state for catalog handlers and the responder.
#[derive(Clone)]
pub struct CatalogContext {
    pub items: Arc<dyn ItemStore>,
    pub broker: Arc<dyn QueueBroker>,
    http: reqwest::Client,
    identity_url: String,
}

impl CatalogContext {
    pub fn new(
        items: Arc<dyn ItemStore>,
        broker: Arc<dyn QueueBroker>,
        identity_url: impl Into<String>,
    ) -> Self {
        Self {
            items,
            broker,
            http: reqwest::Client::new(),
            identity_url: identity_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// A responder bound to this context's store and broker.
    pub fn responder(&self) -> CatalogResponder {
        CatalogResponder::new(Arc::clone(&self.items), Arc::clone(&self.broker))
    }

    /// Fetch `{identity_url}/users` and return its `users` array.
    pub async fn fetch_users(&self) -> Result<Value, CatalogError> {
        let url = format!("{}/users", self.identity_url);
        debug!(url = %url, "Fetching users from identity service");

        let body: Value = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body.get("users").cloned().unwrap_or(Value::Array(Vec::new())))
    }
}
