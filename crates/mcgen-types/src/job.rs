//! Job identification and descriptor types.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Position of a job in the submitted sequence.
///
/// This is the only key that correlates a job across the pending, running,
/// and finished sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(pub usize);

impl JobId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shell command line and the directory it runs in.
///
/// Immutable once built. The working directory is not touched until the
/// job is dequeued, so filesystem errors surface only when it is about to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDescriptor {
    command: String,
    working_dir: PathBuf,
    log_path: Option<PathBuf>,
}

impl JobDescriptor {
    /// Create a descriptor whose log file will be named at launch time.
    pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            working_dir: working_dir.into(),
            log_path: None,
        }
    }

    /// Capture combined stdout/stderr into `path` instead of a timestamped file.
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The explicitly requested log path, if any.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }
}
