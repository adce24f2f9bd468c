//! # Beacon Server
//!
//! Real-time dispatch and notification pipeline. Two WebSocket surfaces sit
//! in front of the shared queue and relay from `beacon-core`:
//!
//! - `/ws` broadcasts every domain event to all connected dashboard viewers
//! - `/notify` delivers worker-produced acknowledgements to the one
//!   connection registered for the target user id
//!
//! Background workers pop jobs from the priority queue and publish the
//! resulting notifications back through the relay, keeping producers and
//! consumers fully decoupled.

pub mod config;
pub mod handlers;
pub mod pumps;
pub mod routes;
pub mod state;
pub mod worker;
pub mod ws;
