//! In-memory queue broker for standalone mode.
//!
//! Keeps one FIFO per queue name inside the process. Ideal for local
//! development and testing without a RabbitMQ instance. Clones share the
//! same queues, so one instance can be handed to both services.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{oneshot, watch, Mutex, Notify, RwLock};
use tracing::{debug, error, info};

use super::{ConsumerHandle, MessageHandler, QueueBroker, Result};

/// How `publish` interacts with a consumer on the same queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Publish returns as soon as the message is queued.
    #[default]
    Queued,
    /// Publish waits until the queue's consumer has handled the message.
    ///
    /// Publish also returns when `try_receive_one` takes the message first or
    /// the consumer stops. Queues without a consumer behave as `Queued`. A
    /// handler must not publish to the queue it consumes in this mode.
    Synchronous,
}

struct Pending {
    seq: u64,
    payload: Vec<u8>,
    /// Dropped or fired once the message leaves the queue's hands.
    done: Option<oneshot::Sender<()>>,
}

#[derive(Default)]
struct QueueState {
    messages: VecDeque<Pending>,
    last_seq: u64,
}

/// One named FIFO.
#[derive(Default)]
struct Queue {
    state: Mutex<QueueState>,
    notify: Notify,
    /// Closes when the queue's consumer stops.
    consumer: RwLock<Option<watch::Receiver<()>>>,
}

impl Queue {
    async fn push(&self, payload: Vec<u8>, done: Option<oneshot::Sender<()>>) -> u64 {
        let seq = {
            let mut state = self.state.lock().await;
            state.last_seq += 1;
            let seq = state.last_seq;
            state.messages.push_back(Pending { seq, payload, done });
            seq
        };
        self.notify.notify_one();
        seq
    }

    async fn pop(&self) -> Option<Pending> {
        self.state.lock().await.messages.pop_front()
    }
}

/// In-process broker.
#[derive(Clone, Default)]
pub struct ChannelBroker {
    queues: Arc<RwLock<HashMap<String, Arc<Queue>>>>,
    mode: DeliveryMode,
}

impl ChannelBroker {
    /// Create a new channel broker.
    pub fn new(mode: DeliveryMode) -> Self {
        info!(mode = ?mode, "Channel broker initialized");

        Self {
            queues: Arc::new(RwLock::new(HashMap::new())),
            mode,
        }
    }

    /// Number of messages waiting on a queue.
    pub async fn depth(&self, queue: &str) -> usize {
        match self.queues.read().await.get(queue) {
            Some(q) => q.state.lock().await.messages.len(),
            None => 0,
        }
    }

    /// Get or create a queue.
    async fn queue(&self, name: &str) -> Arc<Queue> {
        if let Some(queue) = self.queues.read().await.get(name) {
            return Arc::clone(queue);
        }
        let mut queues = self.queues.write().await;
        Arc::clone(queues.entry(name.to_string()).or_default())
    }
}

#[async_trait]
impl QueueBroker for ChannelBroker {
    async fn declare(&self, queue: &str) -> Result<()> {
        self.queue(queue).await;
        debug!(queue = %queue, "Declared queue");
        Ok(())
    }

    #[tracing::instrument(name = "bus.publish", skip_all, fields(queue = %queue))]
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()> {
        let target = self.queue(queue).await;
        let consumer = match self.mode {
            DeliveryMode::Synchronous => target.consumer.read().await.clone(),
            DeliveryMode::Queued => None,
        };

        let (done, waiter) = match consumer {
            Some(alive) => {
                let (tx, rx) = oneshot::channel();
                (Some(tx), Some((rx, alive)))
            }
            None => (None, None),
        };
        let seq = target.push(payload.to_vec(), done).await;

        debug!(seq, bytes = payload.len(), "Published message to channel");

        if let Some((handled, mut alive)) = waiter {
            // The consumer never sends on `alive`; changed() resolves when it stops.
            tokio::select! {
                _ = handled => {}
                _ = alive.changed() => {}
            }
        }

        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<ConsumerHandle> {
        let target = self.queue(queue).await;
        let (alive_tx, alive_rx) = watch::channel(());
        *target.consumer.write().await = Some(alive_rx);

        let name = queue.to_string();
        let task = tokio::spawn(async move {
            let _alive = alive_tx;
            loop {
                let Some(message) = target.pop().await else {
                    target.notify.notified().await;
                    continue;
                };

                debug!(queue = %name, seq = message.seq, "Received message via channel");

                if let Err(e) = handler.handle(message.payload).await {
                    error!(queue = %name, error = %e, "Handler failed, message dropped");
                }
                if let Some(done) = message.done {
                    let _ = done.send(());
                }
            }
        });

        info!(queue = %queue, "Channel consumer started");

        Ok(ConsumerHandle::new(task))
    }

    async fn try_receive_one(&self, queue: &str) -> Result<Option<Vec<u8>>> {
        // Dropping `done` releases a synchronous publisher of this message.
        let message = self.queue(queue).await.pop().await;
        debug!(queue = %queue, found = message.is_some(), "Polled channel");
        Ok(message.map(|m| m.payload))
    }
}

#[cfg(test)]
mod tests;
