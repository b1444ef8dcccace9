//! Audio spool directory configuration.

use serde::{Deserialize, Serialize};

/// Spool storage configuration.
///
/// Uploaded audio is written here by the submission path and deleted by
/// the worker that processed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for spooled audio files.
    #[serde(default = "default_spool_dir")]
    pub spool_dir: String,
    /// Maximum accepted upload size in megabytes.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_size_mb: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            spool_dir: default_spool_dir(),
            max_upload_size_mb: default_max_upload_mb(),
        }
    }
}

fn default_spool_dir() -> String {
    "data/spool".to_string()
}

fn default_max_upload_mb() -> u64 {
    512
}
