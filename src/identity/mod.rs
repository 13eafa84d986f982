//! Identity service.
//!
//! Owns accounts and access tokens. The profile query asks the catalog
//! service for the caller's items over the broker.

pub mod auth;
pub mod http;
pub mod requester;

use std::sync::Arc;

use crate::bus::QueueBroker;
use crate::storage::AccountStore;

pub use auth::{AuthError, TokenIssuer};
pub use requester::{ProfileRequester, RequesterError};

/// Shared state for identity handlers.
#[derive(Clone)]
pub struct IdentityContext {
    pub accounts: Arc<dyn AccountStore>,
    pub requester: ProfileRequester,
    pub tokens: TokenIssuer,
}

impl IdentityContext {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        broker: Arc<dyn QueueBroker>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            accounts,
            requester: ProfileRequester::new(broker),
            tokens,
        }
    }
}
