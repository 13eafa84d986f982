//! Profile item lookup over the broker.
//!
//! Publishes the owner id on the request queue, then takes at most one
//! message off the shared response queue without waiting. Whatever is there
//! is returned as-is: the response carries nothing tying it to this request,
//! so under concurrent lookups a caller can get another caller's items, or
//! nothing if the responder has not answered yet.

use std::sync::Arc;

use tracing::debug;

use crate::bus::{BusError, QueueBroker, REQUEST_QUEUE, RESPONSE_QUEUE};
use crate::envelope::{EnvelopeError, ItemSummary, RequestEnvelope, ResponseEnvelope};

/// Failure of a profile lookup.
#[derive(Debug, thiserror::Error)]
pub enum RequesterError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Sends product requests and polls for a response.
#[derive(Clone)]
pub struct ProfileRequester {
    broker: Arc<dyn QueueBroker>,
}

impl ProfileRequester {
    pub fn new(broker: Arc<dyn QueueBroker>) -> Self {
        Self { broker }
    }

    /// Request `owner_id`'s items and poll once for a reply.
    ///
    /// An empty response queue yields an empty list.
    #[tracing::instrument(name = "requester.request_items", skip(self))]
    pub async fn request_items(&self, owner_id: i64) -> Result<Vec<ItemSummary>, RequesterError> {
        let request = RequestEnvelope::new(owner_id).encode();
        self.broker.publish(REQUEST_QUEUE, &request).await?;

        let Some(payload) = self.broker.try_receive_one(RESPONSE_QUEUE).await? else {
            debug!("No product response waiting");
            return Ok(Vec::new());
        };

        let response = ResponseEnvelope::decode(&payload)?;
        debug!(items = response.items.len(), bytes = payload.len(), "Product response received");
        Ok(response.items)
    }
}
