use tracing::warn;

use crate::transport::message::InboundMessage;
use crate::utils::error::TransportFailure;

/// Receives the stream of messages for one subscription.
///
/// Calls arrive on transport-managed tasks and may run concurrently, so
/// implementations must be `Send + Sync`. Any `Fn(InboundMessage)` closure
/// that is `Send + Sync + 'static` is a handler.
pub trait Handler: Send + Sync + 'static {
    fn on_message(&self, message: InboundMessage);

    /// Called when the stream reports an error. Returning `true` closes the
    /// stream, after which `on_closed` runs and no more messages arrive.
    fn on_error(&self, failure: &TransportFailure) -> bool {
        warn!(error = %failure, "subscription stream error");
        true
    }

    fn on_closed(&self) {}
}

impl<F> Handler for F
where
    F: Fn(InboundMessage) + Send + Sync + 'static,
{
    fn on_message(&self, message: InboundMessage) {
        self(message)
    }
}
