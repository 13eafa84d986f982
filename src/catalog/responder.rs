//! Product-request responder.
//!
//! One long-lived consumer on the request queue. Each delivery is an owner
//! id; the responder looks up that owner's items and publishes the list on
//! the response queue. Deliveries are acknowledged on receipt, so a failed
//! lookup or publish drops the request. There is no retry and no reply.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::bus::{
    BusError, ConsumerHandle, MessageHandler, QueueBroker, REQUEST_QUEUE, RESPONSE_QUEUE,
};
use crate::envelope::{EnvelopeError, RequestEnvelope, ResponseEnvelope};
use crate::storage::{ItemStore, StorageError};

/// Failure while answering one request.
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    #[error("Malformed request: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Lookup failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Response publish failed: {0}")]
    Bus(#[from] BusError),
}

/// Answers product requests from the item store.
#[derive(Clone)]
pub struct CatalogResponder {
    items: Arc<dyn ItemStore>,
    broker: Arc<dyn QueueBroker>,
}

impl CatalogResponder {
    pub fn new(items: Arc<dyn ItemStore>, broker: Arc<dyn QueueBroker>) -> Self {
        Self { items, broker }
    }

    /// Answer a single request payload. Returns the number of items sent.
    #[tracing::instrument(name = "responder.answer", skip_all, fields(bytes = payload.len()))]
    pub async fn answer(&self, payload: &[u8]) -> Result<usize, ResponderError> {
        let request = RequestEnvelope::decode(payload)?;
        let items = self.items.find_by_owner(request.owner_id).await?;

        let response = ResponseEnvelope::from_items(&items).encode()?;
        self.broker.publish(RESPONSE_QUEUE, &response).await?;

        debug!(owner_id = request.owner_id, items = items.len(), "Answered product request");
        Ok(items.len())
    }

    /// Declare both queues and start consuming the request queue.
    ///
    /// The consumer runs until the returned handle is aborted.
    pub async fn spawn(self) -> Result<ConsumerHandle, BusError> {
        self.broker.declare(REQUEST_QUEUE).await?;
        self.broker.declare(RESPONSE_QUEUE).await?;

        let broker = Arc::clone(&self.broker);
        let handle = broker.consume(REQUEST_QUEUE, Arc::new(self)).await?;

        info!(queue = REQUEST_QUEUE, "Catalog responder started");
        Ok(handle)
    }
}

impl MessageHandler for CatalogResponder {
    fn handle(&self, payload: Vec<u8>) -> BoxFuture<'static, crate::bus::Result<()>> {
        let responder = self.clone();
        Box::pin(async move {
            responder
                .answer(&payload)
                .await
                .map(|_| ())
                .map_err(|e| BusError::Handler(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockBroker;
    use crate::envelope::ItemSummary;
    use crate::models::NewItem;
    use crate::storage::MockItemStore;

    async fn seeded_store() -> Arc<MockItemStore> {
        let store = Arc::new(MockItemStore::new());
        for (name, price, owner_id) in [("Widget", 9.99, 7), ("Lamp", 12.5, 42), ("Gadget", 5.0, 7)]
        {
            store
                .add(NewItem {
                    name: name.to_string(),
                    price,
                    owner_id,
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_answer_publishes_owner_items() {
        let broker = Arc::new(MockBroker::new());
        let responder = CatalogResponder::new(seeded_store().await, broker.clone());

        let count = responder.answer(b"7").await.unwrap();

        assert_eq!(count, 2);
        let published = broker.take_published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, RESPONSE_QUEUE);
        let response = ResponseEnvelope::decode(&published[0].1).unwrap();
        assert_eq!(
            response.items,
            vec![
                ItemSummary {
                    id: 1,
                    name: "Widget".to_string(),
                    price: 9.99
                },
                ItemSummary {
                    id: 3,
                    name: "Gadget".to_string(),
                    price: 5.0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_answer_unknown_owner_publishes_empty_array() {
        let broker = Arc::new(MockBroker::new());
        let responder = CatalogResponder::new(seeded_store().await, broker.clone());

        assert_eq!(responder.answer(b"99").await.unwrap(), 0);

        let published = broker.take_published().await;
        assert_eq!(published[0].1, b"[]".to_vec());
    }

    #[tokio::test]
    async fn test_answer_malformed_request_publishes_nothing() {
        let broker = Arc::new(MockBroker::new());
        let responder = CatalogResponder::new(seeded_store().await, broker.clone());

        let result = responder.answer(b"not-a-number").await;

        assert!(matches!(result, Err(ResponderError::Envelope(_))));
        assert_eq!(broker.published_count().await, 0);
    }

    #[tokio::test]
    async fn test_answer_lookup_failure_publishes_nothing() {
        let store = seeded_store().await;
        store.set_fail_on_query(true).await;
        let broker = Arc::new(MockBroker::new());
        let responder = CatalogResponder::new(store, broker.clone());

        let result = responder.answer(b"7").await;

        assert!(matches!(result, Err(ResponderError::Storage(_))));
        assert_eq!(broker.published_count().await, 0);
    }

    #[tokio::test]
    async fn test_answer_publish_failure_is_reported() {
        let broker = Arc::new(MockBroker::new());
        broker.set_fail_on_publish(true).await;
        let responder = CatalogResponder::new(seeded_store().await, broker);

        let result = responder.answer(b"7").await;

        assert!(matches!(result, Err(ResponderError::Bus(_))));
    }

    #[tokio::test]
    async fn test_handle_maps_failure_to_handler_error() {
        let broker = Arc::new(MockBroker::new());
        let responder = CatalogResponder::new(seeded_store().await, broker);

        let result = responder.handle(b"x".to_vec()).await;

        assert!(matches!(result, Err(BusError::Handler(_))));
    }

    #[tokio::test]
    async fn test_spawn_requires_consumer_support() {
        let broker = Arc::new(MockBroker::new());
        let responder = CatalogResponder::new(seeded_store().await, broker);

        let result = responder.spawn().await;

        assert!(matches!(result, Err(BusError::SubscribeNotSupported)));
    }
}
