//! # scribe-entity
//!
//! Domain entities for Scribe: the job record, its status state machine,
//! validated transcription parameters, and the transcript result payload.

pub mod job;

pub use job::{Job, JobStatus, JobUpdate, TaskKind, Transcript, TranscriptionParams};
