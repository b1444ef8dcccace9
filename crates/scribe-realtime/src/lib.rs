//! # scribe-realtime
//!
//! Ephemeral per-job status notification channels. A notifier is a live
//! tap: events published while nobody listens are lost by design, and a
//! subscriber only ever sees events published after it subscribed.

pub mod event;
pub mod memory;
pub mod notifier;
pub mod redis;

pub use event::StatusEvent;
pub use memory::MemoryNotifier;
pub use notifier::{StatusNotifier, StatusStream};
pub use redis::RedisNotifier;
