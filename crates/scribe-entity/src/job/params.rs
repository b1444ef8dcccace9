//! Validated transcription parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use scribe_core::error::AppError;

/// What the model should do with the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Transcribe in the spoken language.
    #[default]
    Transcribe,
    /// Translate to English while transcribing.
    Translate,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transcribe => write!(f, "transcribe"),
            Self::Translate => write!(f, "translate"),
        }
    }
}

/// Parameters for a transcription job.
///
/// Validated once at submission and treated as immutable afterwards; the
/// queue/worker core passes them through without inspecting them.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TranscriptionParams {
    /// Language hint as an ISO code (e.g. `"en"`, `"es"`). `None` means
    /// auto-detect.
    #[validate(length(min = 2, max = 8))]
    pub language: Option<String>,
    /// Task kind.
    #[serde(default)]
    pub task: TaskKind,
    /// Beam size for decoding.
    #[validate(range(min = 1, max = 10))]
    #[serde(default = "default_beam_size")]
    pub beam_size: u8,
    /// Use voice-activity detection to filter silence.
    #[serde(default = "default_true")]
    pub vad_filter: bool,
    /// Include word-level timestamps in the result.
    #[serde(default)]
    pub word_timestamps: bool,
    /// Enable speaker diarization.
    #[serde(default)]
    pub enable_diarization: bool,
    /// Minimum number of speakers for diarization.
    #[validate(range(min = 1, max = 32))]
    pub min_speakers: Option<u8>,
    /// Maximum number of speakers for diarization.
    #[validate(range(min = 1, max = 32))]
    pub max_speakers: Option<u8>,
    /// Original upload filename, kept for logging only.
    #[serde(default)]
    pub original_filename: Option<String>,
}

impl Default for TranscriptionParams {
    fn default() -> Self {
        Self {
            language: None,
            task: TaskKind::Transcribe,
            beam_size: default_beam_size(),
            vad_filter: true,
            word_timestamps: false,
            enable_diarization: false,
            min_speakers: None,
            max_speakers: None,
            original_filename: None,
        }
    }
}

impl TranscriptionParams {
    /// Run all field and cross-field checks, consuming and returning the
    /// parameters so a validated set can be threaded onwards.
    pub fn validated(self) -> Result<Self, AppError> {
        Validate::validate(&self)
            .map_err(|e| AppError::validation(format!("Invalid transcription parameters: {e}")))?;

        if let (Some(min), Some(max)) = (self.min_speakers, self.max_speakers) {
            if min > max {
                return Err(AppError::validation(format!(
                    "min_speakers ({min}) must not exceed max_speakers ({max})"
                )));
            }
        }

        if !self.enable_diarization && (self.min_speakers.is_some() || self.max_speakers.is_some())
        {
            return Err(AppError::validation(
                "Speaker bounds require enable_diarization",
            ));
        }

        Ok(self)
    }
}

fn default_beam_size() -> u8 {
    5
}

fn default_true() -> bool {
    true
}
