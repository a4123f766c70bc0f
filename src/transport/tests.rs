use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use super::{
    Activation, Behavior, Handler, InboundMessage, MemoryConnector, MemoryTransport,
    PublishRequest, SubscribeRequest, TransportClient, TransportConnector,
};
use crate::channel::DeliveryClass;
use crate::classifier::RawOutcome;
use crate::message::EncodedPayload;
use crate::utils::error::{ConnectionError, TransportFailure};

const WAIT: Duration = Duration::from_millis(500);

fn local_publish(topic: &str, text: &str) -> PublishRequest {
    PublishRequest::Topic {
        topic: topic.to_string(),
        qos: DeliveryClass::AtLeastOnce,
        message: EncodedPayload::Text(text.to_string()),
    }
}

fn collecting_handler() -> (
    impl Handler,
    mpsc::UnboundedReceiver<InboundMessage>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = move |message: InboundMessage| {
        let _ = tx.send(message);
    };
    (handler, rx)
}

fn subscribe_request(topic: &str, handler: impl Handler) -> SubscribeRequest {
    SubscribeRequest {
        topic: topic.to_string(),
        handler: Arc::new(handler),
    }
}

#[derive(Default)]
struct CountingHandler {
    errors: AtomicUsize,
    closed: AtomicUsize,
    keep_open: bool,
}

impl Handler for CountingHandler {
    fn on_message(&self, _message: InboundMessage) {}

    fn on_error(&self, _failure: &TransportFailure) -> bool {
        self.errors.fetch_add(1, Ordering::SeqCst);
        !self.keep_open
    }

    fn on_closed(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_ready_activation_settles_immediately() {
    let mut ok = Activation::completed();
    assert!(ok.is_settled());
    assert_eq!(ok.wait(WAIT).await, RawOutcome::Completed);

    let mut failed = Activation::failed(TransportFailure::Disconnected);
    assert_eq!(
        failed.wait(WAIT).await,
        RawOutcome::Failed(TransportFailure::Disconnected)
    );
}

#[tokio::test]
async fn test_activation_elapses_then_observes_late_completion() {
    let (completer, mut activation) = Activation::pending();

    assert_eq!(
        activation.wait(Duration::from_millis(20)).await,
        RawOutcome::Elapsed
    );
    assert!(!activation.is_settled());
    assert_eq!(activation.poll_now(), None);

    completer.succeed();
    assert_eq!(activation.wait(WAIT).await, RawOutcome::Completed);
    assert!(activation.is_settled());
    // Settled activations keep answering.
    assert_eq!(activation.poll_now(), Some(RawOutcome::Completed));
}

#[tokio::test]
async fn test_dropped_completer_is_disconnected() {
    let (completer, mut activation) = Activation::pending();
    drop(completer);
    assert_eq!(
        activation.wait(WAIT).await,
        RawOutcome::Failed(TransportFailure::Disconnected)
    );
}

#[tokio::test]
async fn test_memory_transport_fans_out_to_topic_subscribers() {
    let transport = MemoryTransport::new();
    let (first, mut first_rx) = collecting_handler();
    let (second, mut second_rx) = collecting_handler();
    let (other, mut other_rx) = collecting_handler();

    transport.subscribe(subscribe_request("sensors/temp", first));
    transport.subscribe(subscribe_request("sensors/temp", second));
    transport.subscribe(subscribe_request("sensors/humidity", other));
    assert_eq!(transport.subscriber_count("sensors/temp"), 2);

    let mut activation = transport.publish(local_publish("sensors/temp", r#"{"t":1}"#));
    assert_eq!(activation.wait(WAIT).await, RawOutcome::Completed);

    for rx in [&mut first_rx, &mut second_rx] {
        let inbound = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(inbound.topic, "sensors/temp");
        assert_eq!(inbound.payload, EncodedPayload::Text(r#"{"t":1}"#.to_string()));
    }
    assert!(other_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_cloud_publish_is_recorded_not_dispatched() {
    let transport = MemoryTransport::new();
    let (handler, mut rx) = collecting_handler();
    transport.subscribe(subscribe_request("telemetry", handler));

    let request = PublishRequest::Cloud {
        topic: "telemetry".to_string(),
        qos: DeliveryClass::AtMostOnce,
        payload: b"{}".to_vec(),
    };
    let mut activation = transport.publish(request.clone());

    assert_eq!(activation.wait(WAIT).await, RawOutcome::Completed);
    assert_eq!(transport.published(), vec![request]);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_scripted_failure_applies_to_next_request_only() {
    let transport = MemoryTransport::new();
    transport.script_publish(Behavior::Fail(TransportFailure::Service("busy".to_string())));

    let mut first = transport.publish(local_publish("a", "1"));
    let mut second = transport.publish(local_publish("a", "2"));

    assert_eq!(
        first.wait(WAIT).await,
        RawOutcome::Failed(TransportFailure::Service("busy".to_string()))
    );
    assert_eq!(second.wait(WAIT).await, RawOutcome::Completed);
    assert_eq!(transport.published().len(), 2);
}

#[tokio::test]
async fn test_delayed_subscribe_registers_after_delay() {
    let transport = MemoryTransport::new();
    transport.script_subscribe(Behavior::Delay(Duration::from_millis(60)));
    let (handler, _rx) = collecting_handler();

    let mut activation = transport.subscribe(subscribe_request("commands", handler));
    assert_eq!(transport.subscriber_count("commands"), 0);
    assert_eq!(
        activation.wait(Duration::from_millis(10)).await,
        RawOutcome::Elapsed
    );
    assert_eq!(activation.wait(WAIT).await, RawOutcome::Completed);
    assert_eq!(transport.subscriber_count("commands"), 1);
}

#[tokio::test]
async fn test_failed_subscribe_does_not_register() {
    let transport = MemoryTransport::new();
    transport.script_subscribe(Behavior::Fail(TransportFailure::Unauthorized(
        "commands".to_string(),
    )));
    let (handler, _rx) = collecting_handler();

    let mut activation = transport.subscribe(subscribe_request("commands", handler));
    assert!(matches!(activation.wait(WAIT).await, RawOutcome::Failed(_)));
    assert_eq!(transport.subscriber_count("commands"), 0);
    assert_eq!(transport.subscriptions(), vec!["commands".to_string()]);
}

#[tokio::test]
async fn test_fail_stream_closes_only_handlers_that_ask() {
    let transport = MemoryTransport::new();
    let closing = Arc::new(CountingHandler::default());
    let staying = Arc::new(CountingHandler {
        keep_open: true,
        ..Default::default()
    });

    transport.subscribe(SubscribeRequest {
        topic: "commands".to_string(),
        handler: closing.clone(),
    });
    transport.subscribe(SubscribeRequest {
        topic: "commands".to_string(),
        handler: staying.clone(),
    });

    transport.fail_stream("commands", TransportFailure::Service("reset".to_string()));

    assert_eq!(closing.errors.load(Ordering::SeqCst), 1);
    assert_eq!(closing.closed.load(Ordering::SeqCst), 1);
    assert_eq!(staying.errors.load(Ordering::SeqCst), 1);
    assert_eq!(staying.closed.load(Ordering::SeqCst), 0);
    assert_eq!(transport.subscriber_count("commands"), 1);
}

#[tokio::test]
async fn test_close_releases_hung_requests_and_subscriptions() {
    let transport = MemoryTransport::new();
    let handler = Arc::new(CountingHandler::default());
    transport.subscribe(SubscribeRequest {
        topic: "commands".to_string(),
        handler: handler.clone(),
    });
    transport.script_publish(Behavior::Hang);
    let mut hung = transport.publish(local_publish("commands", "{}"));

    transport.close();

    assert_eq!(
        hung.wait(WAIT).await,
        RawOutcome::Failed(TransportFailure::Disconnected)
    );
    assert_eq!(handler.closed.load(Ordering::SeqCst), 1);
    assert_eq!(transport.subscriber_count("commands"), 0);

    let mut after = transport.publish(local_publish("commands", "{}"));
    assert_eq!(
        after.wait(WAIT).await,
        RawOutcome::Failed(TransportFailure::Disconnected)
    );
}

#[test]
fn test_connector_refusal_is_connection_error() {
    let connector = MemoryConnector::refusing("no ipc socket");
    match connector.connect() {
        Err(ConnectionError::Refused(reason)) => assert_eq!(reason, "no ipc socket"),
        Err(other) => panic!("Expected a refusal, got {other:?}"),
        Ok(_) => panic!("Expected a refusal"),
    }
}

#[test]
fn test_connector_shares_transport_state() {
    let connector = MemoryConnector::default();
    let client = connector.connect().unwrap();
    client.script_publish(Behavior::Complete);
    let _ = client.publish(PublishRequest::Cloud {
        topic: "telemetry".to_string(),
        qos: DeliveryClass::AtLeastOnce,
        payload: Vec::new(),
    });
    assert_eq!(connector.transport().published().len(), 1);
}

#[test]
fn test_publish_request_wire_form() {
    let request = local_publish("sensors/temp", "{}");
    assert_eq!(request.topic(), "sensors/temp");
    assert_eq!(request.qos(), DeliveryClass::AtLeastOnce);
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "type": "publish_to_topic",
            "topic": "sensors/temp",
            "qos": "at_least_once",
            "message": {"type": "json", "message": "{}"}
        })
    );
}

#[tokio::test]
async fn test_take_drains_request_records() {
    let transport = MemoryTransport::new();
    let (handler, _rx) = collecting_handler();
    transport.subscribe(subscribe_request("commands", handler));
    transport.publish(local_publish("commands", "{}"));
    transport.publish(local_publish("commands", "[]"));

    assert_eq!(transport.take_published().len(), 2);
    assert_eq!(transport.take_subscriptions(), vec!["commands".to_string()]);
    assert!(transport.published().is_empty());
    assert!(transport.subscriptions().is_empty());

    transport.publish(local_publish("commands", "{}"));
    assert_eq!(transport.published().len(), 1);
    assert_eq!(transport.subscriber_count("commands"), 1);
}

#[tokio::test]
async fn test_abandoned_hung_requests_are_released() {
    let transport = MemoryTransport::new();
    transport.script_publish(Behavior::Hang);
    transport.script_publish(Behavior::Hang);

    let kept = transport.publish(local_publish("a", "1"));
    let dropped = transport.publish(local_publish("a", "2"));
    assert_eq!(transport.hung_count(), 2);

    drop(dropped);
    assert_eq!(transport.hung_count(), 1);
    drop(kept);
    assert_eq!(transport.hung_count(), 0);
}
