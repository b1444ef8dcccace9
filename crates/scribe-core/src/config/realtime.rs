//! Status notification configuration.

use serde::{Deserialize, Serialize};

/// Status notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Buffer size for per-job broadcast channels (memory backend) and
    /// subscription streams. A subscriber that lags beyond this many
    /// events loses the oldest ones; delivery is best-effort by design.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_buffer_size() -> usize {
    64
}
