//! Wire format
//!
//! Every frame is one JSON object tagged by its `type` field. Inbound frames
//! are decoded into the closed `InboundEvent` type; anything the relay sends is
//! an `OutboundEvent`.
//!
//! Decoding is two-staged: the text must be JSON with a string `type`
//! (otherwise `FrameError`), and only then is the tag matched. A string tag the
//! relay does not know becomes `InboundEvent::Unknown` rather than an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tungstenite::protocol::Message as WsMessage;

/// Text sent in the `connection` welcome frame.
pub const WELCOME_MESSAGE: &str = "Connected to WebSocket server";

/// Text sent in the `error` frame answering a malformed inbound frame.
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid message format";

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("binary frame is not valid UTF-8")]
    NotUtf8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Ping,
    Reset,
    /// `data` is relayed untouched; `None` when the field was absent.
    PickNumber { data: Option<Value> },
    /// A well-formed frame whose `type` is not one the relay handles.
    Unknown(String),
}

impl InboundEvent {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let mut value: Value = serde_json::from_str(text)?;

        let kind = match value.get("type").and_then(Value::as_str) {
            Some(kind) => kind.to_owned(),
            None => return Err(FrameError::MissingType),
        };

        Ok(match kind.as_str() {
            "ping" => InboundEvent::Ping,
            "reset" => InboundEvent::Reset,
            "pick_number" => InboundEvent::PickNumber {
                data: value.get_mut("data").map(Value::take),
            },
            _ => InboundEvent::Unknown(kind),
        })
    }

    /// Decode a binary frame the same way as a text frame.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        let text = std::str::from_utf8(bytes).map_err(|_| FrameError::NotUtf8)?;
        Self::parse(text)
    }
}

/// One entry of the admin's `count_users_online` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUser {
    pub client_id: String,
    pub client_name: String,
    #[serde(with = "iso_millis")]
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsersSnapshot {
    pub count: usize,
    pub users: Vec<OnlineUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundEvent {
    Connection {
        message: String,
        client_id: String,
        client_name: String,
    },
    CountUsersOnline {
        data: UsersSnapshot,
    },
    UserConnected {
        client_id: String,
        client_name: String,
        #[serde(with = "iso_millis")]
        timestamp: DateTime<Utc>,
    },
    UserDisconnected {
        client_id: String,
        client_name: String,
        #[serde(with = "iso_millis")]
        timestamp: DateTime<Utc>,
    },
    Pong,
    Reset,
    PickNumber {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Error {
        message: String,
    },
}

impl OutboundEvent {
    pub fn error(message: impl Into<String>) -> Self {
        OutboundEvent::Error {
            message: message.into(),
        }
    }

    /// Serialize into a WebSocket text frame.
    pub fn to_ws(&self) -> Result<WsMessage, serde_json::Error> {
        serde_json::to_string(self).map(WsMessage::text)
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2025-01-01T12:00:00.000Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
