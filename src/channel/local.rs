use std::sync::Arc;

use tracing::debug;

use crate::channel::{ChannelKind, ChannelOptions, Operation, Publication, settle};
use crate::classifier::OperationOutcome;
use crate::message::Message;
use crate::negotiator;
use crate::transport::{
    Handler, PublishRequest, SubscribeRequest, TransportClient, TransportConnector,
};
use crate::utils::error::ConnectionError;

/// Publishes to and subscribes on named local topics.
pub struct LocalChannel {
    transport: Arc<dyn TransportClient>,
    options: ChannelOptions,
}

impl LocalChannel {
    pub fn new(transport: Arc<dyn TransportClient>, options: ChannelOptions) -> Self {
        Self { transport, options }
    }

    pub fn connect<C: TransportConnector>(
        connector: &C,
        options: ChannelOptions,
    ) -> Result<Self, ConnectionError> {
        let client = connector.connect()?;
        Ok(Self::new(Arc::new(client), options))
    }

    pub fn options(&self) -> &ChannelOptions {
        &self.options
    }

    /// Publishes `message` to `topic`.
    ///
    /// The body is JSON text when the message serializes, otherwise the
    /// bytes under `image` (other fields are dropped), otherwise a JSON
    /// diagnostic. The envelope tells subscribers which one they got.
    pub async fn publish(&self, topic: &str, message: &Message) -> Publication {
        let payload = negotiator::negotiate(message);
        debug!(
            topic,
            binary = payload.is_binary(),
            bytes = payload.len(),
            "negotiated local payload"
        );

        let request = PublishRequest::Topic {
            topic: topic.to_string(),
            qos: self.options.delivery_class,
            message: payload,
        };

        let mut activation = self.transport.publish(request);
        let outcome = settle(
            &mut activation,
            self.options.timeout,
            Operation::Publish,
            ChannelKind::Local,
            topic,
        )
        .await;

        Publication {
            outcome,
            activation,
        }
    }

    /// Subscribes `handler` to `topic`.
    ///
    /// Only the activation is bounded by the timeout. Once it succeeds the
    /// transport calls `handler` for every message on `topic`, on its own
    /// tasks, for as long as the session lives. The handler is never called
    /// from here.
    ///
    /// On `Timeout` the transport still holds the request and may complete
    /// it later, after which the handler starts receiving messages.
    pub async fn subscribe<H: Handler>(&self, topic: &str, handler: H) -> OperationOutcome {
        let request = SubscribeRequest {
            topic: topic.to_string(),
            handler: Arc::new(handler),
        };

        let mut activation = self.transport.subscribe(request);
        settle(
            &mut activation,
            self.options.timeout,
            Operation::Subscribe,
            ChannelKind::Local,
            topic,
        )
        .await
    }
}

impl std::fmt::Debug for LocalChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalChannel")
            .field("transport", &"dyn TransportClient")
            .field("options", &self.options)
            .finish()
    }
}
