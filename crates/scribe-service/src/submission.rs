//! Job submission — validate, spool, create, enqueue.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use scribe_core::config::storage::StorageConfig;
use scribe_core::error::AppError;
use scribe_core::result::AppResult;
use scribe_core::types::JobId;
use scribe_entity::TranscriptionParams;
use scribe_queue::{JobStore, QueueBackend, WorkQueue};

/// Audio container extensions the engine accepts.
const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a", "webm", "opus"];

/// A submitted upload: the audio bytes plus transcription parameters.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    /// Client-supplied file name; only its extension matters.
    pub file_name: String,
    /// Full audio payload.
    pub data: Bytes,
    /// Transcription parameters, not yet validated.
    pub params: TranscriptionParams,
}

/// Handles job submission.
///
/// The spool write happens before the record exists, so a crash mid-path
/// leaks at worst a file (reclaimed by disk cleanup) but never a record
/// pointing at missing audio.
#[derive(Clone)]
pub struct SubmissionService {
    backend: QueueBackend,
    config: StorageConfig,
}

impl std::fmt::Debug for SubmissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionService").finish()
    }
}

impl SubmissionService {
    /// Creates a new submission service.
    pub fn new(backend: QueueBackend, config: StorageConfig) -> Self {
        Self { backend, config }
    }

    /// Accept an upload: validate it, spool the audio, create the job
    /// record, and enqueue the id. Returns the new job id.
    pub async fn submit(&self, request: SubmissionRequest) -> AppResult<JobId> {
        let mut params = request.params.validated()?;

        if request.data.is_empty() {
            return Err(AppError::validation("Uploaded file is empty"));
        }

        let max_bytes = self.config.max_upload_size_mb * 1024 * 1024;
        if request.data.len() as u64 > max_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} MB",
                self.config.max_upload_size_mb
            )));
        }

        let extension = supported_extension(&request.file_name)?;

        if params.original_filename.is_none() {
            params.original_filename = Some(request.file_name.clone());
        }

        let audio_path = self.spool(&request.data, &extension).await?;

        let job_id = match self.backend.store().create(audio_path.clone(), params).await {
            Ok(job_id) => job_id,
            Err(error) => {
                self.discard_spooled(&audio_path).await;
                return Err(error);
            }
        };

        if let Err(error) = self.backend.queue().enqueue(job_id).await {
            // The Queued record stays behind and expires with its TTL;
            // the audio is reclaimed now.
            self.discard_spooled(&audio_path).await;
            return Err(error);
        }

        info!(%job_id, file_name = %request.file_name, bytes = request.data.len(), "Job submitted");
        Ok(job_id)
    }

    /// Write the payload under a fresh name in the spool directory.
    async fn spool(&self, data: &Bytes, extension: &str) -> AppResult<PathBuf> {
        let spool_dir = Path::new(&self.config.spool_dir);
        tokio::fs::create_dir_all(spool_dir).await.map_err(|e| {
            AppError::with_source(
                scribe_core::error::ErrorKind::Storage,
                format!("Failed to create spool directory {}", spool_dir.display()),
                e,
            )
        })?;

        let path = spool_dir.join(format!("{}.{extension}", Uuid::new_v4()));
        tokio::fs::write(&path, data).await.map_err(|e| {
            AppError::with_source(
                scribe_core::error::ErrorKind::Storage,
                format!("Failed to spool audio to {}", path.display()),
                e,
            )
        })?;

        Ok(path)
    }

    async fn discard_spooled(&self, path: &Path) {
        if let Err(error) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), %error, "Failed to remove spooled audio");
        }
    }
}

/// Extract and check the file extension, lowercased.
fn supported_extension(file_name: &str) -> AppResult<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| {
            AppError::validation(format!("File '{file_name}' has no extension"))
        })?;

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::validation(format!(
            "Unsupported file type '.{extension}'. Supported: {}",
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    Ok(extension)
}
