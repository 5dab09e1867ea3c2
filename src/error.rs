//! Error types for the sifting engine
//!
//! Per-URL and per-pattern failures are reported through these variants but
//! never abort a run. Only setup failures (empty inputs, unreadable files,
//! unavailable sink, bad concurrency limit) are fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type SiftResult<T> = Result<T, SiftError>;

/// Errors raised by the sifting engine and its line sources
#[derive(Error, Debug)]
pub enum SiftError {
    #[error("'{url}' is malformed: {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("Patterns file '{}' is empty", .0.display())]
    EmptyPatterns(PathBuf),

    #[error("URLs file '{}' is empty", .0.display())]
    EmptyUrls(PathBuf),

    #[error("No {0} to scan")]
    EmptyInput(&'static str),

    #[error("Cannot open '{}'", .path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create '{}'", .path.display())]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid concurrency limit {0}: must be at least 1")]
    InvalidConcurrency(usize),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}
