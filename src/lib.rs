//! # lotorelay
//!
//! Real-time relay for a multiplayer number-picking game. Clients connect
//! over WebSockets; one client holding the shared admin token observes the
//! game, every other client is a player. Players exchange small control
//! events (`ping`, `reset`, `pick_number`) that are fanned out over fixed
//! topics.
//!
//! ## Modules
//!
//! - `client`: a connected client, its role and its outbound queue.
//! - `registry`: the set of open connections.
//! - `broker`: topic subscriptions and fanout.
//! - `message`: inbound/outbound frame types and their JSON encoding.
//! - `relay`: admission, routing and admin notifications.
//! - `transport`: the WebSocket server.
//! - `api`: the REST login API that hands out the admin token.
//! - `config`: layered configuration.
//! - `utils`: error types and logging.

pub mod api;
pub mod broker;
pub mod client;
pub mod config;
pub mod message;
pub mod registry;
pub mod relay;
pub mod transport;
pub mod utils;
