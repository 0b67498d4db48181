//! The `transport` module accepts WebSocket connections and bridges them to
//! the relay: it performs the handshake, admits the connection, forwards
//! inbound frames and drains each connection's outbound queue into its socket.

pub mod websocket;

pub use websocket::{serve, start_websocket_server};
