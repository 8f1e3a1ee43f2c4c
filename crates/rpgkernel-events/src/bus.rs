//! Topic-keyed, in-process publish/subscribe.
//!
//! `publish` invokes every subscriber on a topic in registration order.
//! A subscriber that fails is logged and skipped; its failure never
//! propagates to the publisher or to other subscribers.

use std::collections::BTreeMap;
use std::sync::Mutex;

use rpgkernel_types::{Event, Topic};

/// A topic subscriber. Returns `Err` with a human-readable reason on failure;
/// the bus logs it and continues to the next subscriber.
pub type Subscriber = Box<dyn Fn(&Event) -> Result<(), String> + Send + Sync>;

/// A registry of subscribers, keyed by topic.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<BTreeMap<Topic, Vec<Subscriber>>>,
}

impl EventBus {
    /// Register a subscriber for a topic. Appended after any existing
    /// subscribers for that topic, so delivery order is registration order.
    pub fn subscribe(&self, topic: Topic, subscriber: Subscriber) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        subscribers.entry(topic).or_default().push(subscriber);
    }

    /// Deliver an event to every subscriber on its topic, in registration order.
    pub fn publish(&self, event: &Event) {
        let subscribers = self.subscribers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(topic_subscribers) = subscribers.get(&event.topic) else {
            return;
        };
        for subscriber in topic_subscribers {
            if let Err(reason) = subscriber(event) {
                tracing::warn!(topic = ?event.topic, kind = ?event.kind, reason, "event subscriber failed");
            }
        }
    }

    /// Number of subscribers currently registered for a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        let subscribers = self.subscribers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        subscribers.get(&topic).map_or(0, Vec::len)
    }
}
