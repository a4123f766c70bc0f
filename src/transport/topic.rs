use std::sync::Arc;

use crate::transport::handler::Handler;

pub type SubscriptionId = u64;

/// A local topic and the handlers subscribed to it.
///
/// The same handler may be subscribed more than once; each subscription gets
/// its own id and receives its own copy of every message.
#[derive(Default)]
pub struct Topic {
    pub name: String,
    subscribers: Vec<(SubscriptionId, Arc<dyn Handler>)>,
}

impl Topic {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, id: SubscriptionId, handler: Arc<dyn Handler>) {
        self.subscribers.push((id, handler));
    }

    /// Removes a subscription, returning its handler if it was present.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Option<Arc<dyn Handler>> {
        let index = self.subscribers.iter().position(|(sub, _)| *sub == id)?;
        Some(self.subscribers.remove(index).1)
    }

    pub fn subscribers(&self) -> impl Iterator<Item = &(SubscriptionId, Arc<dyn Handler>)> {
        self.subscribers.iter()
    }

    pub fn drain(&mut self) -> Vec<Arc<dyn Handler>> {
        self.subscribers.drain(..).map(|(_, handler)| handler).collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
