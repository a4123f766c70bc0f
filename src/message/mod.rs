//! Message definitions for the gateway
//!
//! `Message` is the structured value an application hands to a channel. It is
//! a string-keyed map whose values follow the JSON data model plus raw bytes,
//! so a message may or may not be representable as JSON text.
//!
//! `EncodedPayload` is what actually goes on the wire: either JSON text or
//! raw bytes, never both.
//!
//! Notes on keys:
//! - `image`: reserved. When a message cannot be rendered as text, raw bytes
//!   stored under this key are transmitted as a binary payload instead.

mod value;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use value::Value;

/// Reserved key holding raw image bytes.
pub const IMAGE_KEY: &str = "image";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    fields: BTreeMap<String, Value>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    ///
    /// NaN and infinite floats are stored as `Value::NonFinite`; a message
    /// holding one is not text-serializable.
    ///
    /// ```rust
    /// use ggmq::message::Message;
    ///
    /// let msg = Message::new().with("temperature", 21.5);
    /// assert_eq!(msg.to_json().unwrap(), r#"{"temperature":21.5}"#);
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw bytes under the reserved `image` key, if present and non-empty.
    pub fn image(&self) -> Option<&[u8]> {
        self.get(IMAGE_KEY)
            .and_then(Value::as_bytes)
            .filter(|bytes| !bytes.is_empty())
    }

    /// Renders the whole message as compact JSON text.
    ///
    /// Fails if any value, at any depth, is raw bytes or a non-finite float.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses a JSON object into a message.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl<K, V> FromIterator<(K, V)> for Message
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The transportable form of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum EncodedPayload {
    #[serde(rename = "json")]
    Text(String),
    #[serde(rename = "binary")]
    Binary(Vec<u8>),
}

impl EncodedPayload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            EncodedPayload::Text(text) => Some(text),
            EncodedPayload::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EncodedPayload::Text(text) => text.as_bytes(),
            EncodedPayload::Binary(bytes) => bytes,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, EncodedPayload::Binary(_))
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}
