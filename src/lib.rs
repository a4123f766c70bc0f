//! # ggmq
//!
//! `ggmq` is a dual-transport publish/subscribe gateway. One interface
//! publishes structured messages either to a cloud ingestion point or to
//! local inter-process topics, picks a wire encoding per message, and reports
//! every transport failure as one of a few classified outcomes.
//!
//! ## Core Modules
//!
//! - `channel`: `CloudChannel`, `LocalChannel` and the `MessageChannel` that holds either.
//! - `classifier`: maps raw transport results to `OperationOutcome`.
//! - `config`: loads channel and logging settings from files and environment.
//! - `message`: the `Message` data model and the `EncodedPayload` wire form.
//! - `negotiator`: chooses text or binary encoding for a message.
//! - `transport`: the transport client seam, plus an in-process implementation.
//! - `utils`: error types and logging setup.

pub mod channel;
pub mod classifier;
pub mod config;
pub mod message;
pub mod negotiator;
pub mod transport;
pub mod utils;

pub use channel::{
    ChannelKind, ChannelOptions, CloudChannel, DeliveryClass, LocalChannel, MessageChannel,
    Publication,
};
pub use classifier::OperationOutcome;
pub use message::{EncodedPayload, Message, Value};
pub use transport::{Handler, InboundMessage, TransportClient, TransportConnector};
pub use utils::error::{ConnectionError, TransportFailure};
