use super::*;

#[test]
fn test_queue_names_match_wire_contract() {
    assert_eq!(REQUEST_QUEUE, "product_request");
    assert_eq!(RESPONSE_QUEUE, "product_response");
}

#[test]
fn test_bus_error_display() {
    let err = BusError::Publish("channel closed".to_string());
    assert_eq!(err.to_string(), "Publish failed: channel closed");
}

#[cfg(feature = "channel")]
#[tokio::test]
async fn test_init_broker_channel() {
    let config = MessagingConfig {
        messaging_type: MessagingType::Channel,
        ..Default::default()
    };

    let broker = init_broker(&config).await.unwrap();
    broker.publish(RESPONSE_QUEUE, b"[]").await.unwrap();

    assert_eq!(
        broker.try_receive_one(RESPONSE_QUEUE).await.unwrap(),
        Some(b"[]".to_vec())
    );
}

#[cfg(not(feature = "amqp"))]
#[tokio::test]
async fn test_init_broker_amqp_requires_feature() {
    let config = MessagingConfig::default();

    let result = init_broker(&config).await;

    let err = result.err().unwrap();
    assert!(matches!(err, BusError::Unsupported(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_bus_error_retryable() {
    assert!(BusError::Connection("refused".to_string()).is_retryable());
    assert!(BusError::Receive("channel closed".to_string()).is_retryable());
    assert!(!BusError::Unsupported("amqp".to_string()).is_retryable());
    assert!(!BusError::SubscribeNotSupported.is_retryable());
}
