//! The `client` module defines one connected client of the relay.
//!
//! A `Connection` carries the identity and role fixed at admission plus the
//! `Outbox` through which every frame for that client is queued.

pub mod connection;
pub mod outbox;

pub use connection::{Connection, ConnectionId, Role};
pub use outbox::{BackpressureHook, LogBackpressure, Outbox, QueueGauge};
