//! Redis backend: shared records and a BRPOP-driven work queue.

pub mod client;
pub mod queue;
pub mod store;

pub use client::RedisClient;
pub use queue::RedisWorkQueue;
pub use store::RedisJobStore;
