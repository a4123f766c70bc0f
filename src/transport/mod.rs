//! The `transport` module is the seam between the gateway and whatever
//! actually moves bytes: an IPC session to the host runtime, an MQTT client,
//! or the in-process `MemoryTransport`.
//!
//! It defines the request shapes a channel submits, the handle a submitted
//! request returns, and the handler contract used for subscriptions.

pub mod activation;
pub mod handler;
pub mod memory;
pub mod message;
pub mod topic;

use crate::utils::error::ConnectionError;

pub use activation::{Activation, Completer};
pub use handler::Handler;
pub use memory::{Behavior, MemoryConnector, MemoryTransport};
pub use message::{InboundMessage, PublishRequest, SubscribeRequest};

/// An established transport session.
///
/// Both methods submit the request and return at once; the returned
/// `Activation` resolves when the transport acknowledges or rejects it.
/// Implementations must not block the caller.
pub trait TransportClient: Send + Sync {
    fn publish(&self, request: PublishRequest) -> Activation;

    fn subscribe(&self, request: SubscribeRequest) -> Activation;
}

/// Establishes a transport session.
pub trait TransportConnector {
    type Client: TransportClient + 'static;

    fn connect(&self) -> Result<Self::Client, ConnectionError>;
}

#[cfg(test)]
mod tests;
