//! Relay controller
//!
//! Ties the registry, the broker and the admin notifications together and
//! drives each connection through `CONNECTING -> OPEN -> CLOSED`:
//! - `open` admits a connection: classify, register, subscribe to the role
//!   topic, welcome, notify the admin side
//! - `handle_text` / `handle_bytes` route inbound frames while open
//! - `close` tears a connection down exactly once
//!
//! All state lives in one `Relay` value. The transport shares it as
//! `Arc<Mutex<Relay>>` and never holds the lock across an `.await`, which
//! keeps every mutation on a single serialized path.

pub mod handshake;
mod notifier;
mod router;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::broker::{Broker, TopicName};
use crate::client::{Connection, ConnectionId, Outbox, Role};
use crate::message::{OutboundEvent, UsersSnapshot, WELCOME_MESSAGE};
use crate::registry::Registry;
use crate::utils::RelayError;

pub use handshake::{Identity, classify};

pub type SharedRelay = Arc<Mutex<Relay>>;

/// Lock the shared relay, recovering the state if another task panicked
/// while holding it.
pub fn lock(relay: &Mutex<Relay>) -> MutexGuard<'_, Relay> {
    relay.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of a successful admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub id: ConnectionId,
    pub role: Role,
}

#[derive(Debug)]
pub struct Relay {
    registry: Registry,
    broker: Broker,
    admin_token: String,
}

impl Relay {
    pub fn new(admin_token: impl Into<String>) -> Self {
        Self {
            registry: Registry::new(),
            broker: Broker::new(),
            admin_token: admin_token.into(),
        }
    }

    pub fn shared(self) -> SharedRelay {
        Arc::new(Mutex::new(self))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Admit a connection whose handshake carried `client_name`.
    ///
    /// Fails only with `DuplicateId`, in which case nothing was changed and
    /// the caller should reject the connection.
    pub fn open(
        &mut self,
        client_name: Option<&str>,
        outbox: Outbox,
    ) -> Result<Admission, RelayError> {
        let Identity {
            id,
            display_name,
            role,
        } = classify(client_name, &self.admin_token);

        let conn = self
            .registry
            .register(Connection::new(id.clone(), display_name.clone(), role, outbox))?;
        let connected_at = conn.connected_at;

        self.broker.subscribe(&id, role.topic());

        let welcome = OutboundEvent::Connection {
            message: WELCOME_MESSAGE.to_string(),
            client_id: id.clone(),
            client_name: display_name.clone(),
        };
        if let Err(e) = self.broker.send_direct(&self.registry, &id, &welcome) {
            warn!(connection_id = %id, error = %e, "failed to send welcome");
        }

        match role {
            Role::User => notifier::user_connected(
                &self.registry,
                &self.broker,
                &id,
                &display_name,
                connected_at,
            ),
            Role::Admin => notifier::send_snapshot(&self.registry, &self.broker, &id),
        }

        info!(connection_id = %id, client_name = %display_name, %role, "client connected");
        Ok(Admission { id, role })
    }

    /// Tear down a connection. Returns `false` when it was already closed.
    pub fn close(&mut self, id: &str) -> bool {
        let Some(conn) = self.registry.unregister(id) else {
            return false;
        };
        self.broker.unsubscribe_all(id);

        notifier::user_disconnected(&self.registry, &self.broker, &conn);

        info!(connection_id = %id, client_name = %conn.display_name, role = %conn.role, "client disconnected");
        true
    }

    /// Point-in-time list of the connected non-admin clients.
    pub fn snapshot(&self) -> UsersSnapshot {
        notifier::snapshot(&self.registry)
    }

    /// Topics `id` is subscribed to.
    pub fn subscriptions(&self, id: &str) -> Vec<TopicName> {
        self.broker.subscriptions(id).into_iter().collect()
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.registry.contains(id)
    }
}

#[cfg(test)]
mod tests;
