//! The transcription engine seam.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use scribe_entity::{Transcript, TranscriptionParams};

/// Failure produced by a transcription attempt.
///
/// Carries a human-readable message only; the worker records it on the
/// job verbatim. All transcription failures are permanent for the job —
/// the worker never retries.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TranscribeError {
    message: String,
}

impl TranscribeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Speech-to-text engine.
///
/// Implementations may take minutes per call; the worker holds no locks
/// while a transcription runs.
#[async_trait]
pub trait Transcriber: Send + Sync + std::fmt::Debug {
    /// Transcribe the audio file at `audio_path` with the given
    /// parameters.
    async fn transcribe(
        &self,
        audio_path: &Path,
        params: &TranscriptionParams,
    ) -> Result<Transcript, TranscribeError>;
}
