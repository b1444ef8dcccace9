//! Redis-backed job store.
//!
//! Each job lives in one hash at `{prefix}job:{id}` with a TTL stamped at
//! creation, so abandoned records disappear even if the retention sweep
//! never runs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use scribe_core::error::{AppError, ErrorKind};
use scribe_core::result::AppResult;
use scribe_core::types::JobId;
use scribe_entity::{Job, JobStatus, JobUpdate, TranscriptionParams};
use scribe_realtime::{StatusEvent, StatusNotifier};

use crate::keys;
use crate::store::{apply_patch, validate_patch, JobStore};

use super::client::RedisClient;

const SCAN_BATCH: usize = 1000;

/// Redis-backed job store.
#[derive(Debug, Clone)]
pub struct RedisJobStore {
    client: RedisClient,
    record_ttl: Duration,
    notifier: Arc<dyn StatusNotifier>,
}

impl RedisJobStore {
    /// Create a new store. `record_ttl_days` is stamped onto every record
    /// hash at creation.
    pub fn new(client: RedisClient, record_ttl_days: u32, notifier: Arc<dyn StatusNotifier>) -> Self {
        Self {
            client,
            record_ttl: Duration::days(i64::from(record_ttl_days)),
            notifier,
        }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Store, format!("Redis error: {e}"), e)
    }

    /// Write a full record into its hash.
    async fn write_record(&self, job: &Job) -> AppResult<()> {
        let key = keys::job_record(self.client.prefix(), job.id);
        let fields = record_fields(job)?;
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .hset_multiple(&key, &fields)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    /// Fetch and decode one record hash.
    async fn read_record(&self, job_id: JobId) -> AppResult<Option<Job>> {
        let key = keys::job_record(self.client.prefix(), job_id);
        let mut conn = self.client.conn_mut();
        let fields: HashMap<String, String> = conn.hgetall(&key).await.map_err(Self::map_err)?;
        if fields.is_empty() {
            return Ok(None);
        }
        record_from_fields(job_id, &fields).map(Some)
    }

    /// Walk every record key with SCAN, in batches.
    async fn scan_record_keys(&self) -> AppResult<Vec<String>> {
        let pattern = keys::job_record_pattern(self.client.prefix());
        let mut conn = self.client.conn_mut();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(Self::map_err)?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn create(&self, audio_path: PathBuf, params: TranscriptionParams) -> AppResult<JobId> {
        let job = Job::new(audio_path, params);
        let job_id = job.id;

        self.write_record(&job).await?;

        let key = keys::job_record(self.client.prefix(), job_id);
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .expire(&key, self.record_ttl.num_seconds())
            .await
            .map_err(Self::map_err)?;

        info!(%job_id, "Created job record");
        Ok(job_id)
    }

    async fn get(&self, job_id: JobId) -> AppResult<Option<Job>> {
        self.read_record(job_id).await
    }

    async fn update(&self, job_id: JobId, patch: JobUpdate) -> AppResult<()> {
        let mut job = self
            .read_record(job_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Job {job_id} does not exist")))?;

        validate_patch(&job, &patch)?;
        apply_patch(&mut job, patch);

        // TTL survives: HSET does not touch the key's expiry.
        self.write_record(&job).await?;

        debug!(%job_id, status = %job.status, progress = job.progress, "Updated job record");
        self.notifier
            .publish(&StatusEvent::new(job_id, job.status, job.progress))
            .await;
        Ok(())
    }

    async fn list(&self, status: Option<JobStatus>, limit: usize) -> AppResult<Vec<Job>> {
        let record_keys = self.scan_record_keys().await?;
        let mut jobs = Vec::new();

        for key in record_keys {
            let Some(job_id) = keys::job_id_from_record_key(self.client.prefix(), &key) else {
                continue;
            };
            match self.read_record(job_id).await {
                // Key can expire between SCAN and HGETALL.
                Ok(None) => continue,
                Ok(Some(job)) => {
                    if status.map_or(true, |s| job.status == s) {
                        jobs.push(job);
                    }
                }
                Err(error) => {
                    warn!(%job_id, %error, "Skipping undecodable job record");
                }
            }
        }

        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit);
        Ok(jobs)
    }

    async fn sweep_expired(&self, older_than_days: u32) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        let record_keys = self.scan_record_keys().await?;
        let mut conn = self.client.conn_mut();
        let mut deleted: u64 = 0;

        for key in record_keys {
            let Some(job_id) = keys::job_id_from_record_key(self.client.prefix(), &key) else {
                continue;
            };
            let job = match self.read_record(job_id).await {
                Ok(Some(job)) => job,
                Ok(None) => continue,
                Err(error) => {
                    warn!(%job_id, %error, "Skipping undecodable job record");
                    continue;
                }
            };

            if !job.status.is_terminal() {
                continue;
            }
            let Some(completed_at) = job.completed_at else {
                continue;
            };
            if completed_at >= cutoff {
                continue;
            }

            let _: () = conn.del(&key).await.map_err(Self::map_err)?;
            deleted += 1;
        }

        info!(deleted, "Retention sweep finished");
        Ok(deleted)
    }
}

/// Flatten a record into hash field/value pairs.
fn record_fields(job: &Job) -> AppResult<Vec<(String, String)>> {
    let params = serde_json::to_string(&job.params).map_err(|e| {
        AppError::with_source(ErrorKind::Store, "Failed to encode job params", e)
    })?;

    let mut fields = vec![
        ("status".to_string(), job.status.as_str().to_string()),
        ("progress".to_string(), job.progress.to_string()),
        (
            "audio_path".to_string(),
            job.audio_path.to_string_lossy().into_owned(),
        ),
        ("params".to_string(), params),
        ("created_at".to_string(), job.created_at.to_rfc3339()),
    ];

    if let Some(started_at) = job.started_at {
        fields.push(("started_at".to_string(), started_at.to_rfc3339()));
    }
    if let Some(completed_at) = job.completed_at {
        fields.push(("completed_at".to_string(), completed_at.to_rfc3339()));
    }
    if let Some(result) = &job.result {
        let result = serde_json::to_string(result).map_err(|e| {
            AppError::with_source(ErrorKind::Store, "Failed to encode transcript", e)
        })?;
        fields.push(("result".to_string(), result));
    }
    if let Some(error) = &job.error {
        fields.push(("error".to_string(), error.clone()));
    }

    Ok(fields)
}

/// Rebuild a record from its hash fields.
fn record_from_fields(job_id: JobId, fields: &HashMap<String, String>) -> AppResult<Job> {
    let corrupt =
        |what: &str| AppError::store(format!("Job {job_id} has a corrupt `{what}` field"));

    let status: JobStatus = fields
        .get("status")
        .ok_or_else(|| corrupt("status"))?
        .parse()
        .map_err(|_| corrupt("status"))?;

    let progress: u8 = fields
        .get("progress")
        .ok_or_else(|| corrupt("progress"))?
        .parse()
        .map_err(|_| corrupt("progress"))?;

    let audio_path = PathBuf::from(
        fields
            .get("audio_path")
            .ok_or_else(|| corrupt("audio_path"))?,
    );

    let params: TranscriptionParams =
        serde_json::from_str(fields.get("params").ok_or_else(|| corrupt("params"))?)
            .map_err(|_| corrupt("params"))?;

    let created_at = parse_timestamp(fields.get("created_at"))?.ok_or_else(|| corrupt("created_at"))?;
    let started_at = parse_timestamp(fields.get("started_at"))?;
    let completed_at = parse_timestamp(fields.get("completed_at"))?;

    let result = match fields.get("result") {
        Some(raw) => Some(serde_json::from_str(raw).map_err(|_| corrupt("result"))?),
        None => None,
    };

    Ok(Job {
        id: job_id,
        status,
        audio_path,
        params,
        progress,
        created_at,
        started_at,
        completed_at,
        result,
        error: fields.get("error").cloned(),
    })
}

fn parse_timestamp(raw: Option<&String>) -> AppResult<Option<DateTime<Utc>>> {
    match raw {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Invalid timestamp in record", e)),
    }
}
