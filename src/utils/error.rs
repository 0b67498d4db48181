//! Error types for the relay core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// A connection with this id is already registered.
    #[error("connection id already registered: {0}")]
    DuplicateId(String),

    #[error("no connection registered with id: {0}")]
    NotFound(String),

    /// The outbound channel of a connection has been dropped.
    #[error("outbound channel closed for {0}")]
    ChannelClosed(String),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
