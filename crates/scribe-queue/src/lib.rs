//! # scribe-queue
//!
//! The durable heart of Scribe: the keyed job store with partial updates
//! and expiry, and the strict-FIFO work queue with bounded blocking
//! dequeue. Two backends serve both primitives — in-memory for a single
//! node and tests, Redis for production — selected through
//! [`provider::QueueBackend`].

pub mod keys;
pub mod memory;
pub mod provider;
pub mod queue;
pub mod redis;
pub mod store;

pub use provider::QueueBackend;
pub use queue::WorkQueue;
pub use store::JobStore;
