//! ProcessBackend trait for abstracting how jobs become OS processes.
//!
//! The scheduler only needs two capabilities: start a prepared job, and ask
//! whether it is still running. Keeping them behind a trait lets the
//! scheduling loop be exercised without spawning anything.
//!
//! ```text
//! Scheduler (fill / poll loop)
//!     ↓
//! backend: impl ProcessBackend
//!     ↓
//! ┌───────────────────────────────┬──────────────────────────┐
//! │  LocalBackend (default)       │  FakeBackend (tests)     │
//! │  - sh -c '{ cmd ; } > log'    │  - scripted finish times │
//! │  - try_wait + /proc state     │  - spawn/liveness spy    │
//! └───────────────────────────────┴──────────────────────────┘
//! ```

mod local;

pub use local::{LocalBackend, LocalProcess, DEFAULT_SHELL};

#[cfg(test)]
pub mod testing;

#[cfg(test)]
pub use testing::FakeBackend;

use async_trait::async_trait;

use crate::job::PreparedJob;
use mcgen_types::{LaunchError, PollError};

/// Liveness of a launched process as seen by one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Alive and not in a terminated state.
    Running,
    /// Gone, or still present as a zombie. `code` is the exit status when known.
    Finished { code: Option<i32> },
}

impl ProcessState {
    pub fn is_finished(&self) -> bool {
        matches!(self, ProcessState::Finished { .. })
    }
}

/// Launches jobs and reports their liveness.
///
/// Implementations must never block in `poll`; the scheduler polls every
/// running job on each pass of its loop.
#[async_trait]
pub trait ProcessBackend: Send {
    /// Opaque per-process state owned by the scheduler while the job runs.
    type Handle: Send;

    /// Start the job. Its working directory already exists.
    async fn spawn(&mut self, job: &PreparedJob) -> Result<Self::Handle, LaunchError>;

    /// Non-blocking liveness query.
    async fn poll(&mut self, handle: &mut Self::Handle) -> Result<ProcessState, PollError>;
}
