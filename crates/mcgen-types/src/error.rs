//! Error taxonomy for building and running a batch.
//!
//! Only [`ConfigError`] is returned to callers of a run. Launch and poll
//! failures are per-job and end up in the result stream as a `JobOutcome`.

use std::path::PathBuf;

use thiserror::Error;

/// Malformed input to a run. Raised before any process is launched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{commands} commands but {working_dirs} working directories")]
    LengthMismatch { commands: usize, working_dirs: usize },
    #[error("cannot resolve output directory {path}: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("concurrency limit must be at least 1, got {0}")]
    InvalidConcurrency(usize),
    #[error("max unresolved polls must be at least 1")]
    InvalidUnresolvedLimit,
    #[error("production run incomplete: {finished} of {submitted} jobs finished")]
    ProductionIncomplete { finished: usize, submitted: usize },
    #[error("invalid merge group: {0}")]
    InvalidMergeGroup(String),
}

/// A single job could not be started. The batch carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("cannot create working directory {path}: {reason}")]
    WorkingDirectory { path: PathBuf, reason: String },
    #[error("command not found: {0}")]
    CommandNotFound(String),
    #[error("empty command")]
    EmptyCommand,
    #[error("spawn failed: {0}")]
    Spawn(String),
}

/// The liveness query for a running job failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("liveness query failed: {0}")]
pub struct PollError(pub String);

impl From<std::io::Error> for PollError {
    fn from(err: std::io::Error) -> Self {
        PollError(err.to_string())
    }
}

/// The job queue was advanced past its end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("job queue exhausted")]
    Exhausted,
}
