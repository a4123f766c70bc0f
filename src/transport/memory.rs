//! In-process transport
//!
//! `MemoryTransport` is a complete `TransportClient` that lives inside the
//! process. It is meant for tests and short demos where a real session is
//! not available.
//!
//! - local-topic publishes are fanned out to every handler subscribed to the
//!   same topic, each delivery on its own tokio task
//! - cloud publishes are only recorded
//! - every request the transport receives is recorded for inspection; the
//!   record grows until drained with `take_published` / `take_subscriptions`
//! - the outcome of upcoming requests can be scripted with `Behavior`
//!
//! Delivery happens when a publish resolves successfully; a failed or hung
//! publish reaches nobody.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::transport::activation::{Activation, Completer};
use crate::transport::handler::Handler;
use crate::transport::message::{InboundMessage, PublishRequest, SubscribeRequest};
use crate::transport::topic::{SubscriptionId, Topic};
use crate::transport::{TransportClient, TransportConnector};
use crate::utils::error::{ConnectionError, TransportFailure};

/// How the transport resolves the next scripted request.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Apply the request and resolve immediately.
    Complete,
    /// Reject the request without applying it.
    Fail(TransportFailure),
    /// Apply the request and resolve after the given delay.
    Delay(Duration),
    /// Never resolve until the transport is closed.
    Hang,
}

#[derive(Default)]
struct State {
    topics: HashMap<String, Topic>,
    published: Vec<PublishRequest>,
    subscriptions: Vec<String>,
    publish_script: VecDeque<Behavior>,
    subscribe_script: VecDeque<Behavior>,
    hung: Vec<Completer>,
    next_subscription: SubscriptionId,
    closed: bool,
}

#[derive(Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the behaviour of the next unscripted publish.
    pub fn script_publish(&self, behavior: Behavior) {
        self.lock().publish_script.push_back(behavior);
    }

    /// Queues the behaviour of the next unscripted subscribe.
    pub fn script_subscribe(&self, behavior: Behavior) {
        self.lock().subscribe_script.push_back(behavior);
    }

    /// Every publish request received so far, in arrival order.
    pub fn published(&self) -> Vec<PublishRequest> {
        self.lock().published.clone()
    }

    /// Topics of every subscribe request received so far, in arrival order.
    pub fn subscriptions(&self) -> Vec<String> {
        self.lock().subscriptions.clone()
    }

    /// Returns and clears the publish record.
    pub fn take_published(&self) -> Vec<PublishRequest> {
        std::mem::take(&mut self.lock().published)
    }

    /// Returns and clears the subscribe record.
    pub fn take_subscriptions(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().subscriptions)
    }

    /// Number of active subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock().topics.get(topic).map_or(0, Topic::len)
    }

    /// Reports a stream error to every handler on `topic`.
    ///
    /// Handlers that ask to close are unsubscribed and told so.
    pub fn fail_stream(&self, topic: &str, failure: TransportFailure) {
        let subscribers: Vec<(SubscriptionId, Arc<dyn Handler>)> = self
            .lock()
            .topics
            .get(topic)
            .map(|t| t.subscribers().cloned().collect())
            .unwrap_or_default();

        let closing: Vec<_> = subscribers
            .into_iter()
            .filter(|(_, handler)| handler.on_error(&failure))
            .collect();
        if closing.is_empty() {
            return;
        }

        {
            let mut state = self.lock();
            if let Some(t) = state.topics.get_mut(topic) {
                for (id, _) in &closing {
                    t.unsubscribe(*id);
                }
            }
        }

        for (_, handler) in closing {
            handler.on_closed();
        }
    }

    /// Shuts the transport down.
    ///
    /// Hung requests resolve as `Disconnected`, every subscription is closed
    /// and later requests fail immediately.
    pub fn close(&self) {
        let (hung, handlers) = {
            let mut state = self.lock();
            state.closed = true;
            let hung = std::mem::take(&mut state.hung);
            let handlers: Vec<_> = state.topics.values_mut().flat_map(Topic::drain).collect();
            (hung, handlers)
        };

        drop(hung);
        for handler in handlers {
            handler.on_closed();
        }
        debug!("memory transport closed");
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, request: &PublishRequest) {
        let PublishRequest::Topic { topic, message, .. } = request else {
            return;
        };

        let handlers: Vec<Arc<dyn Handler>> = self
            .lock()
            .topics
            .get(topic)
            .map(|t| t.subscribers().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        debug!(topic = %topic, subscribers = handlers.len(), "dispatching local publish");

        for handler in handlers {
            let inbound = InboundMessage {
                topic: topic.clone(),
                payload: message.clone(),
            };
            tokio::spawn(async move {
                handler.on_message(inbound);
            });
        }
    }

    fn register(&self, request: SubscribeRequest) -> SubscriptionId {
        let mut state = self.lock();
        let id = state.next_subscription;
        state.next_subscription += 1;
        state
            .topics
            .entry(request.topic.clone())
            .or_insert_with(|| Topic::new(&request.topic))
            .subscribe(id, request.handler);
        id
    }

    fn hang(&self) -> Activation {
        let (completer, activation) = Activation::pending();
        let mut state = self.lock();
        state.hung.retain(|c| !c.is_abandoned());
        state.hung.push(completer);
        activation
    }

    /// Number of hung requests whose caller still holds the activation.
    pub fn hung_count(&self) -> usize {
        let mut state = self.lock();
        state.hung.retain(|c| !c.is_abandoned());
        state.hung.len()
    }
}

impl TransportClient for MemoryTransport {
    fn publish(&self, request: PublishRequest) -> Activation {
        let behavior = {
            let mut state = self.lock();
            if state.closed {
                return Activation::failed(TransportFailure::Disconnected);
            }
            state.published.push(request.clone());
            state.publish_script.pop_front().unwrap_or(Behavior::Complete)
        };

        match behavior {
            Behavior::Complete => {
                self.dispatch(&request);
                Activation::completed()
            }
            Behavior::Fail(failure) => Activation::failed(failure),
            Behavior::Delay(after) => {
                let (completer, activation) = Activation::pending();
                let transport = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    transport.dispatch(&request);
                    completer.succeed();
                });
                activation
            }
            Behavior::Hang => self.hang(),
        }
    }

    fn subscribe(&self, request: SubscribeRequest) -> Activation {
        let behavior = {
            let mut state = self.lock();
            if state.closed {
                return Activation::failed(TransportFailure::Disconnected);
            }
            state.subscriptions.push(request.topic.clone());
            state.subscribe_script.pop_front().unwrap_or(Behavior::Complete)
        };

        match behavior {
            Behavior::Complete => {
                let id = self.register(request);
                debug!(subscription = id, "subscription registered");
                Activation::completed()
            }
            Behavior::Fail(failure) => Activation::failed(failure),
            Behavior::Delay(after) => {
                let (completer, activation) = Activation::pending();
                let transport = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    transport.register(request);
                    completer.succeed();
                });
                activation
            }
            Behavior::Hang => self.hang(),
        }
    }
}

/// Hands out clones of one `MemoryTransport`, or refuses to connect.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    transport: MemoryTransport,
    refusal: Option<String>,
}

impl MemoryConnector {
    pub fn new(transport: MemoryTransport) -> Self {
        Self {
            transport,
            refusal: None,
        }
    }

    /// A connector whose every `connect` fails with `reason`.
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            transport: MemoryTransport::new(),
            refusal: Some(reason.into()),
        }
    }

    pub fn transport(&self) -> &MemoryTransport {
        &self.transport
    }
}

impl TransportConnector for MemoryConnector {
    type Client = MemoryTransport;

    fn connect(&self) -> Result<MemoryTransport, ConnectionError> {
        match &self.refusal {
            Some(reason) => Err(ConnectionError::Refused(reason.clone())),
            None => Ok(self.transport.clone()),
        }
    }
}
