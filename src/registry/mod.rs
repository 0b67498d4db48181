//! Connection Registry
//!
//! The set of currently open connections, keyed by id. Like the broker it is
//! plain in-memory state with no locking of its own; the relay serializes all
//! access.

use std::collections::HashMap;

use tungstenite::protocol::Message as WsMessage;

use crate::broker::Deliver;
use crate::client::{Connection, ConnectionId};
use crate::utils::RelayError;

#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, Connection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection: Connection) -> Result<&Connection, RelayError> {
        use std::collections::hash_map::Entry;

        match self.connections.entry(connection.id.clone()) {
            Entry::Occupied(_) => Err(RelayError::DuplicateId(connection.id)),
            Entry::Vacant(slot) => Ok(&*slot.insert(connection)),
        }
    }

    /// Removes and returns the connection. A no-op when it is not registered.
    pub fn unregister(&mut self, id: &str) -> Option<Connection> {
        self.connections.remove(id)
    }

    pub fn get(&self, id: &str) -> Result<&Connection, RelayError> {
        self.connections
            .get(id)
            .ok_or_else(|| RelayError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    /// Every registered non-admin connection, oldest first.
    pub fn list_users(&self) -> Vec<&Connection> {
        let mut users: Vec<&Connection> = self
            .connections
            .values()
            .filter(|c| !c.is_admin())
            .collect();
        users.sort_by(|a, b| a.connected_at.cmp(&b.connected_at).then(a.id.cmp(&b.id)));
        users
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Deliver for Registry {
    fn deliver(&self, connection_id: &str, frame: WsMessage) -> Result<(), RelayError> {
        self.get(connection_id)?.outbox.send(connection_id, frame)
    }
}
