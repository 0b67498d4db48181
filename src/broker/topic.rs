//! Topic management
//!
//! The topic namespace is fixed: `broadcast`, `admin` and `users` exist for
//! the whole process lifetime and are never created or destroyed. A `Topic`
//! holds the ids of its current subscribers; duplicate subscriptions are a
//! no-op.

use std::collections::HashSet;
use std::fmt;

use crate::client::ConnectionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopicName {
    /// Reserved; nothing publishes to it today.
    Broadcast,
    Admin,
    Users,
}

impl TopicName {
    pub const ALL: [TopicName; 3] = [TopicName::Broadcast, TopicName::Admin, TopicName::Users];

    pub fn as_str(self) -> &'static str {
        match self {
            TopicName::Broadcast => "broadcast",
            TopicName::Admin => "admin",
            TopicName::Users => "users",
        }
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct Topic {
    pub name: TopicName,
    pub subscribers: HashSet<ConnectionId>,
}

impl Topic {
    pub fn new(name: TopicName) -> Self {
        Self {
            name,
            subscribers: HashSet::new(),
        }
    }

    /// Add a subscriber. Returns `false` if it was already subscribed.
    pub fn subscribe(&mut self, id: ConnectionId) -> bool {
        self.subscribers.insert(id)
    }

    pub fn unsubscribe(&mut self, id: &str) -> bool {
        self.subscribers.remove(id)
    }
}
