use std::sync::Arc;

use tracing::debug;

use crate::channel::{ChannelKind, ChannelOptions, Operation, Publication, settle};
use crate::classifier::OperationOutcome;
use crate::message::Message;
use crate::negotiator;
use crate::transport::{Handler, PublishRequest, TransportClient, TransportConnector};
use crate::utils::error::ConnectionError;

/// Publishes JSON telemetry to the remote ingestion point.
pub struct CloudChannel {
    transport: Arc<dyn TransportClient>,
    options: ChannelOptions,
}

impl CloudChannel {
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

    /// Publishes `message` as UTF-8 JSON.
    ///
    /// An unserializable message is replaced by a JSON diagnostic; the remote
    /// side only accepts text, so there is no binary fallback here.
    pub async fn publish(&self, topic: &str, message: &Message) -> Publication {
        let request = PublishRequest::Cloud {
            topic: topic.to_string(),
            qos: self.options.delivery_class,
            payload: negotiator::to_text(message).into_bytes(),
        };

        let mut activation = self.transport.publish(request);
        let outcome = settle(
            &mut activation,
            self.options.timeout,
            Operation::Publish,
            ChannelKind::Cloud,
            topic,
        )
        .await;

        Publication {
            outcome,
            activation,
        }
    }

    /// The ingestion point is write-only. This never reaches the transport,
    /// never invokes `handler`, and always reports `Success`.
    pub async fn subscribe<H: Handler>(&self, topic: &str, _handler: H) -> OperationOutcome {
        debug!(topic, "cloud channel does not deliver messages; subscribe ignored");
        OperationOutcome::Success
    }
}

impl std::fmt::Debug for CloudChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudChannel")
            .field("transport", &"dyn TransportClient")
            .field("options", &self.options)
            .finish()
    }
}
