//! Per-job outcomes and the events streamed while a batch runs.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::job::JobId;

/// How a job left the running set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The process was observed to stop running.
    ///
    /// `code` is `None` when the process was killed by a signal, or was seen
    /// as a zombie before its status could be collected.
    Exited { code: Option<i32> },
    /// The process could not be started.
    LaunchFailed { reason: String },
    /// Liveness could not be determined; the slot was reclaimed anyway.
    Unresolved { reason: String },
}

impl std::fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobOutcome::Exited { code: Some(code) } => write!(f, "exited ({})", code),
            JobOutcome::Exited { code: None } => write!(f, "exited (unknown status)"),
            JobOutcome::LaunchFailed { reason } => write!(f, "launch failed: {}", reason),
            JobOutcome::Unresolved { reason } => write!(f, "unresolved: {}", reason),
        }
    }
}

/// One entry per submitted job, produced as the job finishes.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResult {
    pub id: JobId,
    pub command: String,
    /// Wall clock from launch to observed completion. Zero for launch failures.
    #[serde(rename = "elapsed_minutes", serialize_with = "serialize_minutes")]
    pub elapsed: Duration,
    #[serde(flatten)]
    pub outcome: JobOutcome,
    /// Where combined stdout/stderr went, when the job got far enough to have one.
    pub log_path: Option<PathBuf>,
}

impl ScheduleResult {
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }

    /// True when the process was seen to leave the running state.
    pub fn exit_observed(&self) -> bool {
        matches!(self.outcome, JobOutcome::Exited { .. })
    }

    /// True when the process exited with status zero.
    pub fn ok(&self) -> bool {
        matches!(self.outcome, JobOutcome::Exited { code: Some(0) })
    }
}

fn serialize_minutes<S: Serializer>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(elapsed.as_secs_f64() / 60.0)
}

/// Progress notifications delivered while a batch runs.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    Started {
        id: JobId,
        command: String,
        log_path: PathBuf,
    },
    Finished(ScheduleResult),
}
