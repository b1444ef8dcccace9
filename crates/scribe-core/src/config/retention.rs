//! Terminal-job retention configuration.

use serde::{Deserialize, Serialize};

/// Retention sweep configuration.
///
/// The sweep deletes Completed/Failed jobs whose completion predates the
/// cutoff. It never touches Queued or Processing jobs regardless of age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Whether the periodic sweep is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Age threshold in days for terminal jobs.
    #[serde(default = "default_days")]
    pub days: u32,
    /// Cron schedule (six-field, with seconds) for the sweep.
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            days: default_days(),
            schedule: default_schedule(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_days() -> u32 {
    7
}

fn default_schedule() -> String {
    // Top of every hour.
    "0 0 * * * *".to_string()
}
