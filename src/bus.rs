//! Topic-keyed publish/subscribe between independent parts of the client.
//!
//! Delivery is synchronous and ordered by subscription. A publish walks a
//! snapshot of the handler list taken when it starts, so handlers added or
//! removed during delivery only affect later publishes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Event names known to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// The set of conversations changed (one was created or deleted).
    ConversationListChanged,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::ConversationListChanged => "conversation-list-changed",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Handler = Arc<dyn Fn(Option<&serde_json::Value>) + Send + Sync>;

#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<Mutex<HashMap<Topic, Vec<(SubscriptionId, Handler)>>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(Option<&serde_json::Value>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Returns whether a handler was removed.
    pub fn unsubscribe(&self, topic: Topic, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = handlers.get_mut(&topic) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sid, _)| *sid != id);
        before != list.len()
    }

    pub fn publish(&self, topic: Topic, payload: Option<&serde_json::Value>) {
        let snapshot: Vec<Handler> = {
            let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
            match handlers.get(&topic) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return,
            }
        };

        tracing::debug!(topic = topic.as_str(), handlers = snapshot.len(), "Publishing");
        for handler in snapshot {
            handler(payload);
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> =
            handlers.iter().map(|(t, l)| (t.as_str(), l.len())).collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}
