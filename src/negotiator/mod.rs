//! Payload negotiation
//!
//! Decides, per message, how it travels: as JSON text when the whole message
//! can be rendered as text, otherwise as the raw bytes of its `image` field,
//! otherwise as a JSON diagnostic describing why serialization failed.
//!
//! `negotiate` is total. Callers never handle a negotiation failure; the only
//! failures left to handle are the transport's.

use serde_json::json;
use tracing::debug;

use crate::message::{EncodedPayload, IMAGE_KEY, Message};

/// Prefix of the diagnostic sent in place of an unserializable message.
pub const SERIALIZE_FAILURE_PREFIX: &str = "Failed to serialize the message";

/// Chooses a transportable encoding for `message`.
pub fn negotiate(message: &Message) -> EncodedPayload {
    let err = match message.to_json() {
        Ok(text) => return EncodedPayload::Text(text),
        Err(err) => err,
    };

    if let Some(image) = message.image() {
        debug!(
            bytes = image.len(),
            dropped = ?message.keys().filter(|k| *k != IMAGE_KEY).collect::<Vec<_>>(),
            "message is not text-serializable, sending image bytes"
        );
        return EncodedPayload::Binary(image.to_vec());
    }

    debug!(error = %err, "message is not text-serializable and has no image");
    EncodedPayload::Text(diagnostic(&err))
}

/// Renders text for `message`, substituting the diagnostic when it cannot be
/// serialized. There is no binary fallback here.
pub fn to_text(message: &Message) -> String {
    message.to_json().unwrap_or_else(|err| {
        debug!(error = %err, "message is not text-serializable");
        diagnostic(&err)
    })
}

/// `{"error": "Failed to serialize the message: <description>"}` as JSON text.
pub fn diagnostic(err: &impl std::fmt::Display) -> String {
    json!({ "error": format!("{SERIALIZE_FAILURE_PREFIX}: {err}") }).to_string()
}
