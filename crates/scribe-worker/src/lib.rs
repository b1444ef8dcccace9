//! # scribe-worker
//!
//! Background processing for Scribe:
//! - A worker runner that claims queued jobs and drives them to a
//!   terminal status
//! - A cron scheduler for the periodic retention sweep
//! - The [`Transcriber`] seam behind which the speech-to-text engine
//!   lives

pub mod command;
pub mod runner;
pub mod scheduler;
pub mod transcriber;

pub use command::CommandTranscriber;
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
pub use transcriber::{TranscribeError, Transcriber};
