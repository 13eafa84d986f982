//! Mock broker implementation for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BusError, ConsumerHandle, MessageHandler, QueueBroker, Result};

/// Mock broker for testing.
///
/// Records every publish and serves `try_receive_one` from whatever was
/// published (or staged) on that queue. Consumers are not supported.
#[derive(Default)]
pub struct MockBroker {
    queues: RwLock<HashMap<String, VecDeque<Vec<u8>>>>,
    published: RwLock<Vec<(String, Vec<u8>)>>,
    fail_on_publish: RwLock<bool>,
    fail_on_receive: RwLock<bool>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_publish(&self, fail: bool) {
        *self.fail_on_publish.write().await = fail;
    }

    pub async fn set_fail_on_receive(&self, fail: bool) {
        *self.fail_on_receive.write().await = fail;
    }

    /// Put a message on a queue without recording it as published.
    pub async fn stage(&self, queue: &str, payload: impl Into<Vec<u8>>) {
        self.queues
            .write()
            .await
            .entry(queue.to_string())
            .or_default()
            .push_back(payload.into());
    }

    pub async fn published_count(&self) -> usize {
        self.published.read().await.len()
    }

    pub async fn take_published(&self) -> Vec<(String, Vec<u8>)> {
        std::mem::take(&mut *self.published.write().await)
    }
}

#[async_trait]
impl QueueBroker for MockBroker {
    async fn declare(&self, queue: &str) -> Result<()> {
        self.queues
            .write()
            .await
            .entry(queue.to_string())
            .or_default();
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()> {
        if *self.fail_on_publish.read().await {
            return Err(BusError::Connection("Mock publish failure".to_string()));
        }
        self.published
            .write()
            .await
            .push((queue.to_string(), payload.to_vec()));
        self.stage(queue, payload).await;
        Ok(())
    }

    async fn consume(
        &self,
        _queue: &str,
        _handler: Arc<dyn MessageHandler>,
    ) -> Result<ConsumerHandle> {
        Err(BusError::SubscribeNotSupported)
    }

    async fn try_receive_one(&self, queue: &str) -> Result<Option<Vec<u8>>> {
        if *self.fail_on_receive.read().await {
            return Err(BusError::Connection("Mock receive failure".to_string()));
        }
        Ok(self
            .queues
            .write()
            .await
            .get_mut(queue)
            .and_then(VecDeque::pop_front))
    }
}
