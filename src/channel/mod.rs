//! Message channels
//!
//! A channel is a publish/subscribe capability bound to one transport
//! session for its whole life. There are two kinds:
//!
//! - `CloudChannel`: write-only ingestion point. Messages always travel as
//!   JSON text; `subscribe` is a no-op that reports success.
//! - `LocalChannel`: named local topics. Messages travel as JSON text or raw
//!   bytes, chosen per message by the negotiator; handlers can subscribe.
//!
//! `MessageChannel` puts both behind one value so callers can hold either.
//!
//! Concurrency and usage notes:
//! - Channels are `Send + Sync` and take `&self`; concurrent calls share the
//!   underlying session and take no locks of their own.
//! - Every publish and every subscribe activation waits at most the channel
//!   timeout. A timeout does not cancel the request: the transport may still
//!   apply it afterwards, and the returned `Activation` will show that.

mod cloud;
mod local;
mod options;

use std::fmt;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::classifier::{OperationOutcome, classify};
use crate::message::Message;
use crate::transport::{Activation, Handler, TransportConnector};
use crate::utils::error::ConnectionError;

pub use cloud::CloudChannel;
pub use local::LocalChannel;
pub use options::{ChannelOptions, DEFAULT_TIMEOUT, DeliveryClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Cloud,
    Local,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Cloud => write!(f, "cloud"),
            ChannelKind::Local => write!(f, "local"),
        }
    }
}

/// Result of a publish.
///
/// `outcome` is the answer. `activation` is the submitted request itself,
/// returned on every path so a caller that saw `Timeout` can still find out
/// whether the transport completed it later.
#[derive(Debug)]
pub struct Publication {
    pub outcome: OperationOutcome,
    pub activation: Activation,
}

impl Publication {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[derive(Debug)]
pub enum MessageChannel {
    Cloud(CloudChannel),
    Local(LocalChannel),
}

impl MessageChannel {
    /// Connects a channel of the given kind.
    ///
    /// A connection failure is returned exactly as the connector reported it.
    pub fn connect<C: TransportConnector>(
        kind: ChannelKind,
        connector: &C,
        options: ChannelOptions,
    ) -> Result<Self, ConnectionError> {
        Ok(match kind {
            ChannelKind::Cloud => MessageChannel::Cloud(CloudChannel::connect(connector, options)?),
            ChannelKind::Local => MessageChannel::Local(LocalChannel::connect(connector, options)?),
        })
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            MessageChannel::Cloud(_) => ChannelKind::Cloud,
            MessageChannel::Local(_) => ChannelKind::Local,
        }
    }

    pub fn options(&self) -> &ChannelOptions {
        match self {
            MessageChannel::Cloud(channel) => channel.options(),
            MessageChannel::Local(channel) => channel.options(),
        }
    }

    pub async fn publish(&self, topic: &str, message: &Message) -> Publication {
        match self {
            MessageChannel::Cloud(channel) => channel.publish(topic, message).await,
            MessageChannel::Local(channel) => channel.publish(topic, message).await,
        }
    }

    pub async fn subscribe<H: Handler>(&self, topic: &str, handler: H) -> OperationOutcome {
        match self {
            MessageChannel::Cloud(channel) => channel.subscribe(topic, handler).await,
            MessageChannel::Local(channel) => channel.subscribe(topic, handler).await,
        }
    }
}

impl From<CloudChannel> for MessageChannel {
    fn from(channel: CloudChannel) -> Self {
        MessageChannel::Cloud(channel)
    }
}

impl From<LocalChannel> for MessageChannel {
    fn from(channel: LocalChannel) -> Self {
        MessageChannel::Local(channel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Publish,
    Subscribe,
}

impl Operation {
    fn progressive(self) -> &'static str {
        match self {
            Operation::Publish => "publishing to",
            Operation::Subscribe => "subscribing to",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Publish => write!(f, "publish"),
            Operation::Subscribe => write!(f, "subscribe"),
        }
    }
}

/// Waits on `activation`, classifies what happened and logs it with the
/// operation, channel and topic.
pub(crate) async fn settle(
    activation: &mut Activation,
    timeout: Duration,
    operation: Operation,
    channel: ChannelKind,
    topic: &str,
) -> OperationOutcome {
    let id = Uuid::new_v4();
    let outcome = classify(&activation.wait(timeout).await);
    let doing = operation.progressive();

    match &outcome {
        OperationOutcome::Success => {
            info!(%id, %operation, %channel, topic, "Successfully completed {operation} on topic: {topic}");
        }
        OperationOutcome::Timeout => {
            warn!(%id, %operation, %channel, topic, ?timeout, "Timeout occurred while {doing} topic: {topic}");
        }
        OperationOutcome::Unauthorized => {
            warn!(%id, %operation, %channel, topic, "Unauthorized error while {doing} topic: {topic}");
        }
        OperationOutcome::TransportError(detail) => {
            error!(%id, %operation, %channel, topic, error = %detail, "Transport error while {doing} topic: {topic}. {detail}");
        }
    }

    outcome
}
