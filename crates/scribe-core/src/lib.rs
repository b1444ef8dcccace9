//! # scribe-core
//!
//! Core crate for Scribe. Contains the unified error system, typed
//! identifiers, and configuration schemas.
//!
//! This crate has **no** internal dependencies on other Scribe crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
