//! Job store and work queue backend configuration.

use serde::{Deserialize, Serialize};

/// Backend configuration shared by the job store, the work queue, and
/// the status notifier.
///
/// All three primitives are always served by the same backend so that a
/// job record, its queue entry, and its status channel live in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Backend type: `"memory"` or `"redis"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// TTL applied to every job record at creation, in days. Orphaned
    /// records self-clean after this long even without a sweep.
    #[serde(default = "default_record_ttl_days")]
    pub record_ttl_days: u32,
    /// Redis-specific settings.
    #[serde(default)]
    pub redis: RedisQueueConfig,
}

/// Redis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisQueueConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all Scribe keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            record_ttl_days: default_record_ttl_days(),
            redis: RedisQueueConfig::default(),
        }
    }
}

impl Default for RedisQueueConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_record_ttl_days() -> u32 {
    7
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "scribe:".to_string()
}
