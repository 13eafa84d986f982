use super::*;
use crate::bus::{BusError, REQUEST_QUEUE, RESPONSE_QUEUE};
use crate::test_utils::RecordingHandler;
use futures::future::BoxFuture;
use std::time::Duration;

/// Signals when a delivery starts, then holds it until released.
struct GatedHandler {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl MessageHandler for GatedHandler {
    fn handle(&self, _payload: Vec<u8>) -> BoxFuture<'static, std::result::Result<(), BusError>> {
        let started = Arc::clone(&self.started);
        let release = Arc::clone(&self.release);
        Box::pin(async move {
            started.notify_one();
            release.notified().await;
            Ok(())
        })
    }
}

#[tokio::test]
async fn test_channel_publish_without_consumer_queues_message() {
    let broker = ChannelBroker::new(DeliveryMode::Queued);

    broker.publish(REQUEST_QUEUE, b"7").await.unwrap();

    assert_eq!(broker.depth(REQUEST_QUEUE).await, 1);
    assert_eq!(broker.depth(RESPONSE_QUEUE).await, 0);
}

#[tokio::test]
async fn test_channel_try_receive_one_empty_queue() {
    let broker = ChannelBroker::new(DeliveryMode::Queued);
    broker.declare(RESPONSE_QUEUE).await.unwrap();

    let message = broker.try_receive_one(RESPONSE_QUEUE).await.unwrap();

    assert!(message.is_none());
}

#[tokio::test]
async fn test_channel_try_receive_one_is_fifo() {
    let broker = ChannelBroker::new(DeliveryMode::Queued);
    broker.publish(RESPONSE_QUEUE, b"first").await.unwrap();
    broker.publish(RESPONSE_QUEUE, b"second").await.unwrap();

    assert_eq!(
        broker.try_receive_one(RESPONSE_QUEUE).await.unwrap(),
        Some(b"first".to_vec())
    );
    assert_eq!(
        broker.try_receive_one(RESPONSE_QUEUE).await.unwrap(),
        Some(b"second".to_vec())
    );
    assert_eq!(broker.try_receive_one(RESPONSE_QUEUE).await.unwrap(), None);
}

#[tokio::test]
async fn test_channel_declare_is_idempotent() {
    let broker = ChannelBroker::new(DeliveryMode::Queued);
    broker.publish(REQUEST_QUEUE, b"1").await.unwrap();

    broker.declare(REQUEST_QUEUE).await.unwrap();
    broker.declare(REQUEST_QUEUE).await.unwrap();

    // Re-declaring must not drop pending messages
    assert_eq!(broker.depth(REQUEST_QUEUE).await, 1);
}

#[tokio::test]
async fn test_channel_consumer_receives_in_publish_order() {
    let broker = ChannelBroker::new(DeliveryMode::Queued);
    let handler = RecordingHandler::new();
    let received = handler.received();

    let consumer = broker
        .consume(REQUEST_QUEUE, Arc::new(handler))
        .await
        .unwrap();

    for owner in ["1", "2", "3"] {
        broker.publish(REQUEST_QUEUE, owner.as_bytes()).await.unwrap();
    }

    // Give consumer time to drain
    tokio::time::sleep(Duration::from_millis(50)).await;

    let received = received.lock().await.clone();
    assert_eq!(received, vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
    assert_eq!(broker.depth(REQUEST_QUEUE).await, 0);
    consumer.abort();
}

#[tokio::test]
async fn test_channel_consumer_drains_backlog() {
    let broker = ChannelBroker::new(DeliveryMode::Queued);
    broker.publish(REQUEST_QUEUE, b"early").await.unwrap();

    let handler = RecordingHandler::new();
    let received = handler.received();
    let _consumer = broker
        .consume(REQUEST_QUEUE, Arc::new(handler))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(received.lock().await.len(), 1);
}

#[tokio::test]
async fn test_channel_handler_failure_drops_message() {
    let broker = ChannelBroker::new(DeliveryMode::Synchronous);
    let handler = RecordingHandler::failing(BusError::Handler("boom".to_string()));
    let received = handler.received();

    let _consumer = broker
        .consume(REQUEST_QUEUE, Arc::new(handler))
        .await
        .unwrap();

    broker.publish(REQUEST_QUEUE, b"7").await.unwrap();

    // Auto-ack: the failed delivery is gone, not requeued
    assert_eq!(received.lock().await.len(), 1);
    assert_eq!(broker.depth(REQUEST_QUEUE).await, 0);
}

#[tokio::test]
async fn test_channel_synchronous_publish_waits_for_consumer() {
    let broker = ChannelBroker::new(DeliveryMode::Synchronous);
    let handler = RecordingHandler::new();
    let received = handler.received();

    let _consumer = broker
        .consume(REQUEST_QUEUE, Arc::new(handler))
        .await
        .unwrap();

    broker.publish(REQUEST_QUEUE, b"42").await.unwrap();

    // No sleep: synchronous publish returns after the handler ran
    assert_eq!(received.lock().await.clone(), vec![b"42".to_vec()]);
}

#[tokio::test]
async fn test_channel_synchronous_publish_after_abort_does_not_hang() {
    let broker = ChannelBroker::new(DeliveryMode::Synchronous);
    let consumer = broker
        .consume(REQUEST_QUEUE, Arc::new(RecordingHandler::new()))
        .await
        .unwrap();

    consumer.abort();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let result = tokio::time::timeout(
        Duration::from_millis(500),
        broker.publish(REQUEST_QUEUE, b"7"),
    )
    .await;

    assert!(result.is_ok(), "publish blocked on an aborted consumer");
    assert_eq!(broker.depth(REQUEST_QUEUE).await, 1);
}

#[tokio::test]
async fn test_channel_synchronous_publish_released_when_polled_first() {
    let broker = ChannelBroker::new(DeliveryMode::Synchronous);
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let _consumer = broker
        .consume(
            REQUEST_QUEUE,
            Arc::new(GatedHandler {
                started: Arc::clone(&started),
                release: Arc::clone(&release),
            }),
        )
        .await
        .unwrap();

    // The consumer takes "7" and holds it
    let first = tokio::spawn({
        let broker = broker.clone();
        async move { broker.publish(REQUEST_QUEUE, b"7").await }
    });
    started.notified().await;

    // "42" queues behind it and is taken by a poll instead of the consumer
    let second = tokio::spawn({
        let broker = broker.clone();
        async move { broker.publish(REQUEST_QUEUE, b"42").await }
    });
    while broker.depth(REQUEST_QUEUE).await == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        broker.try_receive_one(REQUEST_QUEUE).await.unwrap(),
        Some(b"42".to_vec())
    );

    let second = tokio::time::timeout(Duration::from_millis(500), second).await;
    assert!(second.is_ok(), "publish blocked on a message taken by a poll");
    assert!(!first.is_finished());

    release.notify_one();
    let first = tokio::time::timeout(Duration::from_millis(500), first).await;
    assert!(first.unwrap().unwrap().is_ok());
}

#[tokio::test]
async fn test_channel_clones_share_queues() {
    let catalog_side = ChannelBroker::new(DeliveryMode::Queued);
    let identity_side = catalog_side.clone();

    identity_side.publish(REQUEST_QUEUE, b"7").await.unwrap();

    assert_eq!(
        catalog_side.try_receive_one(REQUEST_QUEUE).await.unwrap(),
        Some(b"7".to_vec())
    );
}
