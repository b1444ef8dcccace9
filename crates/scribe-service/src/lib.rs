//! # scribe-service
//!
//! The two collaborator-facing paths of Scribe:
//! - [`SubmissionService`]: validate an upload, spool it, create the job
//!   record, enqueue the id
//! - [`StatusService`]: point lookups, listings, queue depth, and live
//!   status subscriptions

pub mod status;
pub mod submission;

pub use status::StatusService;
pub use submission::{SubmissionRequest, SubmissionService};
