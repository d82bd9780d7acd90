//! Subscription bookkeeping for reconnect replay

use std::collections::HashMap;

/// Desired subscriptions, keyed by topic filter
///
/// The registry remembers what the user wants subscribed so the session can
/// replay it after a reconnect. Re-adding an existing topic overwrites its
/// QoS. The registry itself is not synchronized; it lives inside the
/// session's state lock.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionRegistry {
    topics: HashMap<String, u8>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert: a repeated topic replaces the stored QoS
    pub fn add(&mut self, topic: &str, qos: u8) {
        self.topics.insert(topic.to_string(), qos);
    }

    /// No-op if the topic was never added
    pub fn remove(&mut self, topic: &str) {
        self.topics.remove(topic);
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    pub fn qos(&self, topic: &str) -> Option<u8> {
        self.topics.get(topic).copied()
    }

    /// Restartable iteration over (topic, qos); order is not meaningful
    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.topics.iter().map(|(t, q)| (t.as_str(), *q))
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn clear(&mut self) {
        self.topics.clear();
    }
}
