//! mcgen-kernel: the scheduler core of mcgenstudy.
//!
//! This crate provides:
//!
//! - **Job Queue**: ordered hand-out of pending jobs, no reordering
//! - **Scheduler**: runs shell commands under a concurrency limit with
//!   liveness polling, streaming completions as they happen
//! - **Backends**: the `ProcessBackend` seam and the local OS implementation
//! - **Merge**: planning of post-processing merge jobs over finished runs
//! - **Config**: TOML configuration for the `mcgenstudy` binary
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        Scheduler                          │
//! │  JobQueue ──fill──▶ running (≤ N) ──poll──▶ finished      │
//! │                        │    ▲                             │
//! │                  spawn │    │ poll                        │
//! │                        ▼    │                             │
//! │                 ProcessBackend (LocalBackend: sh -c)      │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod config;
pub mod glob;
pub mod job;
pub mod merge;
pub mod queue;
pub mod scheduler;
pub mod shell;

pub use backend::{LocalBackend, LocalProcess, ProcessBackend, ProcessState};
pub use config::StudyConfig;
pub use job::{build_jobs, prepare, PreparedJob};
pub use merge::{plan_merge_jobs, MergeGroup, MergeSettings};
pub use queue::JobQueue;
pub use scheduler::{run_commands, Scheduler, SchedulerOptions};

// Data types, so embedders need only one dependency
pub use mcgen_types::{
    ConfigError, JobDescriptor, JobId, JobOutcome, LaunchError, PollError, QueueError,
    ScheduleResult, SchedulerEvent,
};
