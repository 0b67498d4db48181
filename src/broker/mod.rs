//! Topic Broker
//!
//! Keeps the subscriber set of every topic and fans events out to them.
//! Delivery goes through the `Deliver` seam so the broker never owns sockets;
//! the connection registry implements it for the running relay.

pub mod engine;
pub mod topic;

pub use engine::{Broker, Deliver};
pub use topic::{Topic, TopicName};
