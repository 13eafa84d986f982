//! AMQP (RabbitMQ) broker implementation.
//!
//! Uses the default exchange, so the routing key is the queue name. Every
//! operation borrows a pooled connection, opens a fresh channel, declares its
//! queue durable and closes the channel again before returning.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{BackoffBuilder, ExponentialBuilder};
use deadpool_lapin::{Manager, Pool, PoolError};
use lapin::{
    options::{BasicConsumeOptions, BasicGetOptions, BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, ConnectionProperties,
};
use tracing::{debug, error, info, warn};

use super::{BusError, ConsumerHandle, MessageHandler, QueueBroker, Result};
use crate::config::AmqpConfig;

/// The default exchange routes by queue name.
const DEFAULT_EXCHANGE: &str = "";

/// AMQP reply code for a normal channel close.
const REPLY_SUCCESS: u16 = 200;

/// AMQP broker using RabbitMQ.
pub struct AmqpBroker {
    pool: Pool,
    consumer_tag: String,
}

impl AmqpBroker {
    /// Create a new AMQP broker and verify the connection.
    pub async fn connect(config: &AmqpConfig) -> Result<Self> {
        let manager = Manager::new(config.url.clone(), ConnectionProperties::default());
        let pool = Pool::builder(manager)
            .max_size(config.pool_size)
            .build()
            .map_err(|e| BusError::Connection(format!("Failed to create pool: {}", e)))?;

        // Verify connection
        pool.get()
            .await
            .map_err(|e| BusError::Connection(format!("Failed to connect: {}", e)))?;

        info!(url = %config.url, pool_size = config.pool_size, "Connected to AMQP");

        Ok(Self {
            pool,
            consumer_tag: format!("profile-bridge-{}", uuid::Uuid::new_v4()),
        })
    }

    /// Open a channel on a pooled connection.
    async fn open_channel(pool: &Pool) -> Result<Channel> {
        let conn = pool.get().await.map_err(|e: PoolError| {
            BusError::Connection(format!("Failed to get connection from pool: {}", e))
        })?;

        conn.create_channel()
            .await
            .map_err(|e| BusError::Connection(format!("Failed to create channel: {}", e)))
    }

    async fn declare_durable(channel: &Channel, queue: &str) -> Result<()> {
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map(|_| ())
            .map_err(|e| BusError::Declare(format!("Failed to declare queue {}: {}", queue, e)))
    }

    /// Run one operation on a fresh channel with `queue` declared.
    ///
    /// The channel is closed on every exit path, including declare failure.
    async fn with_channel<T, F, Fut>(&self, queue: &str, op: F) -> Result<T>
    where
        F: FnOnce(Channel) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let channel = Self::open_channel(&self.pool).await?;

        let result = match Self::declare_durable(&channel, queue).await {
            Ok(()) => op(channel.clone()).await,
            Err(e) => Err(e),
        };

        if let Err(e) = channel.close(REPLY_SUCCESS, "OK").await {
            debug!(queue = %queue, error = %e, "Failed to close channel");
        }

        result
    }

    /// Consumer loop with automatic reconnection and exponential backoff with jitter.
    async fn consume_with_reconnect(
        pool: Pool,
        queue: String,
        consumer_tag: String,
        handler: Arc<dyn MessageHandler>,
    ) {
        use futures::StreamExt;

        // Exponential backoff with jitter to prevent thundering herd
        let backoff_builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(30))
            .with_jitter();

        let mut backoff_iter = backoff_builder.build();

        loop {
            match Self::setup_consumer(&pool, &queue, &consumer_tag).await {
                Ok(mut consumer) => {
                    info!(queue = %queue, "Consumer connected, processing messages");
                    // Reset backoff on successful connection
                    backoff_iter = backoff_builder.build();

                    // Process messages until stream ends
                    while let Some(delivery) = consumer.next().await {
                        match delivery {
                            Ok(delivery) => {
                                // no_ack: the broker already considers this delivered
                                if let Err(e) = handler.handle(delivery.data).await {
                                    error!(queue = %queue, error = %e, "Handler failed, message dropped");
                                }
                            }
                            Err(e) => {
                                error!(error = %e, "Consumer delivery error, will reconnect");
                                break;
                            }
                        }
                    }

                    warn!(queue = %queue, "Consumer stream ended, reconnecting...");
                }
                Err(e) => {
                    let delay = backoff_iter.next().unwrap_or(Duration::from_secs(30));
                    error!(
                        error = %e,
                        backoff_ms = %delay.as_millis(),
                        queue = %queue,
                        "Failed to set up consumer, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }

            // Brief pause before reconnecting after stream end (not error)
            let delay = backoff_iter.next().unwrap_or(Duration::from_secs(30));
            tokio::time::sleep(delay).await;
        }
    }

    /// Set up consumer channel and durable queue.
    async fn setup_consumer(
        pool: &Pool,
        queue: &str,
        consumer_tag: &str,
    ) -> Result<lapin::Consumer> {
        let channel = Self::open_channel(pool).await?;
        Self::declare_durable(&channel, queue).await?;

        channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BusError::Subscribe(format!("Failed to start consumer: {}", e)))
    }
}

#[async_trait]
impl QueueBroker for AmqpBroker {
    async fn declare(&self, queue: &str) -> Result<()> {
        self.with_channel(queue, |_| async { Ok(()) }).await?;
        debug!(queue = %queue, "Declared durable queue");
        Ok(())
    }

    #[tracing::instrument(name = "bus.publish", skip_all, fields(queue = %queue))]
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()> {
        self.with_channel(queue, |channel| async move {
            let properties = BasicProperties::default().with_delivery_mode(2); // persistent

            let confirm = channel
                .basic_publish(
                    DEFAULT_EXCHANGE,
                    queue,
                    BasicPublishOptions::default(),
                    payload,
                    properties,
                )
                .await
                .map_err(|e| BusError::Publish(format!("Failed to publish: {}", e)))?;

            confirm
                .await
                .map_err(|e| BusError::Publish(format!("Publish confirmation failed: {}", e)))?;

            Ok(())
        })
        .await?;

        debug!(bytes = payload.len(), "Published message");
        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<ConsumerHandle> {
        let pool = self.pool.clone();
        let queue = queue.to_string();
        let consumer_tag = self.consumer_tag.clone();

        // Spawn consumer task with reconnection loop
        let task = tokio::spawn(async move {
            Self::consume_with_reconnect(pool, queue, consumer_tag, handler).await;
        });

        Ok(ConsumerHandle::new(task))
    }

    #[tracing::instrument(name = "bus.get", skip_all, fields(queue = %queue))]
    async fn try_receive_one(&self, queue: &str) -> Result<Option<Vec<u8>>> {
        let message = self
            .with_channel(queue, |channel| async move {
                channel
                    .basic_get(queue, BasicGetOptions { no_ack: true })
                    .await
                    .map_err(|e| BusError::Receive(format!("Failed to get message: {}", e)))
            })
            .await?;

        debug!(found = message.is_some(), "Polled queue");
        Ok(message.map(|m| m.delivery.data))
    }
}
