//! In-memory backend for single-node deployments and tests.

pub mod queue;
pub mod store;

pub use queue::MemoryWorkQueue;
pub use store::MemoryJobStore;
