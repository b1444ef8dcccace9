//! Transcript result payload.
//!
//! The queue/worker core stores this verbatim and never inspects it; the
//! shape exists so clients get a typed result rather than loose JSON.

use serde::{Deserialize, Serialize};

/// A word with its timing, emitted when word timestamps are requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// The word text.
    pub word: String,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    /// Model confidence for this word.
    pub probability: f64,
    /// Speaker label (e.g. `"SPEAKER_00"`) when diarization ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// A timed segment of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    /// Segment text.
    pub text: String,
    /// Speaker label when diarization ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Word-level timings when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

/// The full transcription result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Full transcript text.
    pub text: String,
    /// Detected (or hinted) language code.
    pub language: String,
    /// Model confidence in the detected language.
    pub language_probability: f64,
    /// Total audio duration in seconds.
    pub duration: f64,
    /// Ordered timed segments.
    pub segments: Vec<Segment>,
    /// Name of the model that produced the transcript.
    pub model: String,
    /// Wall-clock processing time in seconds.
    pub processing_time: f64,
}
