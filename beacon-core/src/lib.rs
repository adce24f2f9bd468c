//! # Beacon Core
//!
//! Domain types and shared primitives for the Beacon dispatch pipeline:
//!
//! - [`job`]: jobs popped by workers and the notifications they produce
//! - [`queue`]: the priority-ordered, double-ended job queue
//! - [`relay`]: named-channel publish/subscribe between pipeline stages
//! - [`dispatch`]: the producer-facing facade combining relay and queue
//!
//! Everything here is transport-agnostic; the WebSocket servers and worker
//! loops live in `beacon-server`.

pub mod dispatch;
pub mod job;
pub mod queue;
pub mod relay;

pub use dispatch::Dispatcher;
pub use job::{Job, Notification, TaskType};
pub use queue::{JobQueue, QueueError};
pub use relay::{Relay, RelayMessage, channels};
