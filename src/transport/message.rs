use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::channel::DeliveryClass;
use crate::message::EncodedPayload;
use crate::transport::handler::Handler;

/// A publish submitted to the transport.
///
/// `Cloud` targets the remote ingestion point and always carries UTF-8 JSON
/// bytes. `Topic` targets the local broadcast bus and carries a tagged
/// envelope so the receiver knows whether the body is text or binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PublishRequest {
    #[serde(rename = "publish_to_cloud")]
    Cloud {
        topic: String,
        qos: DeliveryClass,
        payload: Vec<u8>,
    },

    #[serde(rename = "publish_to_topic")]
    Topic {
        topic: String,
        qos: DeliveryClass,
        message: EncodedPayload,
    },
}

impl PublishRequest {
    pub fn topic(&self) -> &str {
        match self {
            PublishRequest::Cloud { topic, .. } | PublishRequest::Topic { topic, .. } => topic,
        }
    }

    pub fn qos(&self) -> DeliveryClass {
        match self {
            PublishRequest::Cloud { qos, .. } | PublishRequest::Topic { qos, .. } => *qos,
        }
    }
}

/// A subscription submitted to the transport.
///
/// The handler is owned by the subscription from here on.
#[derive(Clone)]
pub struct SubscribeRequest {
    pub topic: String,
    pub handler: Arc<dyn Handler>,
}

impl fmt::Debug for SubscribeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeRequest")
            .field("topic", &self.topic)
            .field("handler", &"dyn Handler")
            .finish()
    }
}

/// A message delivered to a subscription handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: EncodedPayload,
}
