//! Durable named-queue broker.
//!
//! This module contains:
//! - `QueueBroker` trait: declare, publish, consume, non-blocking get
//! - `MessageHandler` trait: for processing deliveries on a consumer
//! - Broker factory driven by `MessagingConfig`
//! - Implementations: AMQP (RabbitMQ), in-process channel, Mock
//!
//! Delivery is at-least-once per queue and FIFO only within one queue read
//! by one consumer. Consumers acknowledge on receipt: a handler failure
//! loses the message.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{MessagingConfig, MessagingType};

// Implementation modules
#[cfg(feature = "amqp")]
pub mod amqp;
#[cfg(feature = "channel")]
pub mod channel;
pub mod mock;

// Re-exports
#[cfg(feature = "amqp")]
pub use amqp::AmqpBroker;
#[cfg(feature = "channel")]
pub use channel::{ChannelBroker, DeliveryMode};
pub use mock::MockBroker;

/// Queue carrying owner-id lookup requests from Identity to Catalog.
pub const REQUEST_QUEUE: &str = "product_request";
/// Queue carrying item lists from Catalog back to Identity.
pub const RESPONSE_QUEUE: &str = "product_response";

// ============================================================================
// Traits
// ============================================================================

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors that can occur during broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Declare failed: {0}")]
    Declare(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Subscribe not supported for this broker type")]
    SubscribeNotSupported,

    #[error("Unsupported broker: {0}")]
    Unsupported(String),
}

impl BusError {
    /// Whether trying the same operation again can succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Unsupported(_) | Self::SubscribeNotSupported)
    }
}

/// Handler for deliveries on a consumer subscription.
pub trait MessageHandler: Send + Sync {
    /// Process one delivered payload.
    ///
    /// The message is already acknowledged when this runs.
    fn handle(&self, payload: Vec<u8>) -> BoxFuture<'static, Result<()>>;
}

/// Handle to a running consumer task.
///
/// Dropping the handle leaves the consumer running; call `abort` to stop it.
#[derive(Debug)]
pub struct ConsumerHandle {
    task: JoinHandle<()>,
}

impl ConsumerHandle {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Stop the consumer. In-flight deliveries are lost.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// True once the consumer task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Named-queue broker contract used by the bridge.
///
/// `publish` and `try_receive_one` declare their queue before touching it, so
/// a fresh broker behaves the same whichever side starts first.
///
/// Implementations:
/// - `AmqpBroker`: RabbitMQ via AMQP, fresh channel per operation
/// - `ChannelBroker`: in-process queues for standalone mode and tests
/// - `MockBroker`: in-memory mock with failure injection
#[async_trait]
pub trait QueueBroker: Send + Sync {
    /// Ensure the named queue exists and survives a broker restart. Idempotent.
    async fn declare(&self, queue: &str) -> Result<()>;

    /// Enqueue a payload.
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()>;

    /// Start a single auto-ack consumer on the queue.
    ///
    /// The handler is invoked once per delivery, in publish order.
    async fn consume(&self, queue: &str, handler: Arc<dyn MessageHandler>)
        -> Result<ConsumerHandle>;

    /// Dequeue at most one pending message without waiting.
    async fn try_receive_one(&self, queue: &str) -> Result<Option<Vec<u8>>>;
}

// ============================================================================
// Factory
// ============================================================================

/// Initialize the broker based on configuration.
///
/// Requires the corresponding feature to be enabled:
/// - AMQP: `--features amqp`
/// - Channel: `--features channel` (included in default)
pub async fn init_broker(config: &MessagingConfig) -> Result<Arc<dyn QueueBroker>> {
    match config.messaging_type {
        MessagingType::Amqp => {
            #[cfg(feature = "amqp")]
            {
                let broker = AmqpBroker::connect(&config.amqp).await?;
                info!(messaging_type = "amqp", "Broker initialized");
                Ok(Arc::new(broker))
            }

            #[cfg(not(feature = "amqp"))]
            {
                Err(BusError::Unsupported(
                    "AMQP support requires the 'amqp' feature. Rebuild with --features amqp"
                        .to_string(),
                ))
            }
        }
        MessagingType::Channel => {
            #[cfg(feature = "channel")]
            {
                warn!("Channel broker is process-local; services in other processes will not see it");
                info!(messaging_type = "channel", "Broker initialized");
                Ok(Arc::new(ChannelBroker::new(DeliveryMode::Queued)))
            }

            #[cfg(not(feature = "channel"))]
            {
                Err(BusError::Unsupported(
                    "Channel support requires the 'channel' feature. Rebuild with --features channel"
                        .to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests;
