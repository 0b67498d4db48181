//! Role classification at admission.
//!
//! The shared admin token is both the admin's credential and its connection
//! id. This is the only place that compares against it.

use uuid::Uuid;

use crate::client::{ConnectionId, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: ConnectionId,
    pub display_name: String,
    pub role: Role,
}

/// Decide id, display name and role for a connection that presented
/// `client_name` during the handshake.
pub fn classify(client_name: Option<&str>, admin_token: &str) -> Identity {
    match client_name {
        Some(name) if !admin_token.is_empty() && name == admin_token => Identity {
            id: admin_token.to_string(),
            display_name: admin_token.to_string(),
            role: Role::Admin,
        },
        name => {
            let id = Uuid::new_v4().to_string();
            let display_name = match name {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => format!("Client-{id}"),
            };
            Identity {
                id,
                display_name,
                role: Role::User,
            }
        }
    }
}

/// Pull `clientName` out of an upgrade request's query string.
pub fn client_name_from_query(query: Option<&str>) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "clientName")
        .map(|(_, value)| value.into_owned())
}
