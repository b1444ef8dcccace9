//! Transcription job domain entities.

pub mod model;
pub mod params;
pub mod status;
pub mod transcript;

pub use model::{Job, JobUpdate};
pub use params::{TaskKind, TranscriptionParams};
pub use status::JobStatus;
pub use transcript::{Segment, Transcript, Word};
