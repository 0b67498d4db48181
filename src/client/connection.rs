use std::fmt;

use chrono::{DateTime, Utc};

use crate::broker::TopicName;
use crate::client::Outbox;
use crate::message::OnlineUser;

pub type ConnectionId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// The one topic a connection of this role is subscribed to.
    pub fn topic(self) -> TopicName {
        match self {
            Role::Admin => TopicName::Admin,
            Role::User => TopicName::Users,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

/// One logical client session. Identity, name and role never change after
/// admission; a reconnect is always a new `Connection`.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub display_name: String,
    pub role: Role,
    pub connected_at: DateTime<Utc>,
    pub outbox: Outbox,
}

impl Connection {
    pub fn new(id: ConnectionId, display_name: String, role: Role, outbox: Outbox) -> Self {
        Self {
            id,
            display_name,
            role,
            connected_at: Utc::now(),
            outbox,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn summary(&self) -> OnlineUser {
        OnlineUser {
            client_id: self.id.clone(),
            client_name: self.display_name.clone(),
            connected_at: self.connected_at,
        }
    }
}
