//! Wire payloads exchanged over the request and response queues.
//!
//! Request: the owner id as a decimal string, e.g. `7`.
//! Response: a JSON array of `{"id", "name", "price"}` objects.
//!
//! Neither envelope carries a correlation id. A response is matched to a
//! request only by its position in the shared response queue.

use serde::{Deserialize, Serialize};

use crate::models::Item;

/// Errors raised while decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Request payload is not UTF-8")]
    NotUtf8,

    #[error("Invalid owner id {0:?}")]
    InvalidOwnerId(String),

    #[error("Invalid response payload: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Item as seen by the identity service. Omits the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            price: item.price,
        }
    }
}

/// Lookup request placed on the request queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub owner_id: i64,
}

impl RequestEnvelope {
    pub fn new(owner_id: i64) -> Self {
        Self { owner_id }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.owner_id.to_string().into_bytes()
    }

    /// Parse a decimal owner id. Surrounding whitespace is ignored.
    pub fn decode(payload: &[u8]) -> Result<Self, EnvelopeError> {
        let text = std::str::from_utf8(payload).map_err(|_| EnvelopeError::NotUtf8)?;
        let owner_id = text
            .trim()
            .parse()
            .map_err(|_| EnvelopeError::InvalidOwnerId(text.to_string()))?;
        Ok(Self { owner_id })
    }
}

/// Item list placed on the response queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseEnvelope {
    pub items: Vec<ItemSummary>,
}

impl ResponseEnvelope {
    pub fn new(items: Vec<ItemSummary>) -> Self {
        Self { items }
    }

    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> Self {
        Self::new(items.into_iter().map(ItemSummary::from).collect())
    }

    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_slice(payload)?)
    }
}
