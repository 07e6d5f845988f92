//! Topic subscriptions: per topic, the set of sessions that opted in.

use std::{
    collections::{BTreeSet, HashMap},
    sync::RwLock,
};

use {pixelbot_common::types::SessionId, tracing::info};

#[derive(Default)]
pub struct Subscriptions {
    topics: RwLock<HashMap<String, BTreeSet<SessionId>>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (replace) the session's flag for `topic`. Returns whether the
    /// flag actually changed.
    pub fn set(&self, topic: &str, session: &SessionId, subscribed: bool) -> bool {
        let mut topics = self.topics.write().unwrap_or_else(|e| e.into_inner());
        let set = topics.entry(topic.to_string()).or_default();
        let changed = if subscribed {
            set.insert(session.clone())
        } else {
            set.remove(session)
        };
        if changed {
            info!(topic, session = %session, subscribed, "subscription changed");
        }
        changed
    }

    pub fn is_subscribed(&self, topic: &str, session: &SessionId) -> bool {
        self.topics
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(topic)
            .is_some_and(|set| set.contains(session))
    }

    /// Sessions subscribed to `topic`, in a stable order.
    pub fn subscribers(&self, topic: &str) -> Vec<SessionId> {
        self.topics
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(topic)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POWER: &str = "power_state";

    #[test]
    fn toggling_replaces_state() {
        let subs = Subscriptions::new();
        let s = SessionId::from(1);
        assert!(subs.set(POWER, &s, true));
        assert!(!subs.set(POWER, &s, true));
        assert_eq!(subs.subscribers(POWER).len(), 1);
        assert!(subs.set(POWER, &s, false));
        assert!(!subs.is_subscribed(POWER, &s));
        assert!(subs.subscribers(POWER).is_empty());
    }

    #[test]
    fn topics_are_independent() {
        let subs = Subscriptions::new();
        let s = SessionId::from(1);
        subs.set(POWER, &s, true);
        assert!(!subs.is_subscribed("battery", &s));
    }

    #[test]
    fn subscribers_are_ordered() {
        let subs = Subscriptions::new();
        for id in [3, 1, 2] {
            subs.set(POWER, &SessionId::from(id), true);
        }
        let ids: Vec<_> = subs
            .subscribers(POWER)
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
