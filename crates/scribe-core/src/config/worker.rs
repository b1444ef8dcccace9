//! Worker pool configuration.

use serde::{Deserialize, Serialize};

/// Transcription worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker pool is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of worker loops to run. Each loop processes one job at a
    /// time; parallelism comes from running several loops.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Bounded wait for the blocking dequeue, in seconds. On expiry the
    /// worker re-checks the shutdown signal and polls again.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
    /// Fixed backoff after a store/queue infrastructure error, in seconds.
    #[serde(default = "default_backoff")]
    pub error_backoff_seconds: u64,
    /// Engine binary the workers invoke for transcription.
    #[serde(default = "default_engine_command")]
    pub engine_command: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            workers: default_workers(),
            poll_timeout_seconds: default_poll_timeout(),
            error_backoff_seconds: default_backoff(),
            engine_command: default_engine_command(),
        }
    }
}

fn default_engine_command() -> String {
    "whisper-engine".to_string()
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    2
}

fn default_poll_timeout() -> u64 {
    5
}

fn default_backoff() -> u64 {
    5
}
