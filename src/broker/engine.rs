//! Broker engine
//!
//! The API is synchronous and must only be driven from the single relay
//! control path (the `Relay` holds the broker behind one lock). Fanout is
//! best effort: a subscriber that cannot be written to is logged and skipped,
//! and the publisher never sees the failure.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::topic::{Topic, TopicName};
use crate::client::ConnectionId;
use crate::message::OutboundEvent;
use crate::utils::RelayError;

/// Hands an encoded frame to one connection.
pub trait Deliver {
    fn deliver(&self, connection_id: &str, frame: WsMessage) -> Result<(), RelayError>;
}

#[derive(Debug)]
pub struct Broker {
    pub topics: HashMap<TopicName, Topic>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    pub fn new() -> Self {
        Self {
            topics: TopicName::ALL
                .into_iter()
                .map(|name| (name, Topic::new(name)))
                .collect(),
        }
    }

    /// Idempotent.
    pub fn subscribe(&mut self, connection_id: &str, topic: TopicName) {
        if let Some(t) = self.topics.get_mut(&topic) {
            if t.subscribe(connection_id.to_string()) {
                debug!(connection_id, %topic, "subscribed");
            }
        }
    }

    pub fn unsubscribe(&mut self, connection_id: &str, topic: TopicName) {
        if let Some(t) = self.topics.get_mut(&topic) {
            t.unsubscribe(connection_id);
        }
    }

    /// Removes the connection from every topic it is subscribed to.
    pub fn unsubscribe_all(&mut self, connection_id: &str) {
        for (topic, t) in self.topics.iter_mut() {
            if t.unsubscribe(connection_id) {
                debug!(connection_id, %topic, "unsubscribed");
            }
        }
    }

    /// Topics the connection currently receives broadcasts for.
    pub fn subscriptions(&self, connection_id: &str) -> BTreeSet<TopicName> {
        self.topics
            .values()
            .filter(|t| t.subscribers.contains(connection_id))
            .map(|t| t.name)
            .collect()
    }

    pub fn subscribers(&self, topic: TopicName) -> Vec<ConnectionId> {
        self.topics
            .get(&topic)
            .map(|t| t.subscribers.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Deliver `event` to every current subscriber of `topic`, skipping
    /// `except` when given. Returns how many subscribers it was handed to.
    pub fn publish<D: Deliver>(
        &self,
        sink: &D,
        topic: TopicName,
        event: &OutboundEvent,
        except: Option<&str>,
    ) -> usize {
        let Some(t) = self.topics.get(&topic) else {
            return 0;
        };

        let frame = match event.to_ws() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%topic, error = %e, "failed to serialize event");
                return 0;
            }
        };

        let mut delivered = 0;
        for sub_id in &t.subscribers {
            if except == Some(sub_id.as_str()) {
                continue;
            }
            match sink.deliver(sub_id, frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(%topic, subscriber = %sub_id, error = %e, "fanout delivery failed"),
            }
        }

        debug!(%topic, delivered, "published");
        delivered
    }

    /// Deliver `event` to exactly one connection.
    pub fn send_direct<D: Deliver>(
        &self,
        sink: &D,
        connection_id: &str,
        event: &OutboundEvent,
    ) -> Result<(), RelayError> {
        let frame = event.to_ws()?;
        sink.deliver(connection_id, frame)
    }
}
