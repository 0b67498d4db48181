//! Admin notifications: lifecycle events and the online-users snapshot.
//!
//! Connect events are never published for the admin's own admission, while
//! disconnect events are published for every connection.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::broker::{Broker, TopicName};
use crate::client::Connection;
use crate::message::{OutboundEvent, UsersSnapshot};
use crate::registry::Registry;

pub(crate) fn snapshot(registry: &Registry) -> UsersSnapshot {
    let users: Vec<_> = registry.list_users().into_iter().map(Connection::summary).collect();
    UsersSnapshot {
        count: users.len(),
        users,
    }
}

pub(crate) fn send_snapshot(registry: &Registry, broker: &Broker, admin_id: &str) {
    let event = OutboundEvent::CountUsersOnline {
        data: snapshot(registry),
    };
    if let Err(e) = broker.send_direct(registry, admin_id, &event) {
        warn!(connection_id = admin_id, error = %e, "failed to send users snapshot");
    }
}

pub(crate) fn user_connected(
    registry: &Registry,
    broker: &Broker,
    id: &str,
    name: &str,
    timestamp: DateTime<Utc>,
) {
    let event = OutboundEvent::UserConnected {
        client_id: id.to_string(),
        client_name: name.to_string(),
        timestamp,
    };
    broker.publish(registry, TopicName::Admin, &event, None);
}

pub(crate) fn user_disconnected(registry: &Registry, broker: &Broker, conn: &Connection) {
    let event = OutboundEvent::UserDisconnected {
        client_id: conn.id.clone(),
        client_name: conn.display_name.clone(),
        timestamp: Utc::now(),
    };
    broker.publish(registry, TopicName::Admin, &event, None);
}
