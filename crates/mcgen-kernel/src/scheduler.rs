//! The bounded concurrent process scheduler.
//!
//! One loop owns all scheduling state. Each pass:
//!
//! 1. **Fill** free slots from the queue, in submission order.
//! 2. **Poll** every running job without blocking on any of them.
//! 3. **Back off** for `poll_interval` only if nothing finished this pass,
//!    so freed slots are refilled without delay.
//!
//! The loop ends when every submitted job has a result. That check runs
//! right after the fill step too, so an empty batch (or one where every
//! launch failed) returns without polling or sleeping.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::backend::{ProcessBackend, ProcessState};
use crate::job::{build_jobs, prepare};
use crate::queue::JobQueue;
use mcgen_types::{
    ConfigError, JobDescriptor, JobId, JobOutcome, LaunchError, PollError, ScheduleResult,
    SchedulerEvent,
};

/// Sleep between polls when nothing finished.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Consecutive failed liveness queries before a job is reported `Unresolved`.
pub const DEFAULT_MAX_UNRESOLVED_POLLS: u32 = 3;

/// Tuning for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Maximum number of jobs running at once.
    pub concurrency: usize,
    pub poll_interval: Duration,
    pub max_unresolved_polls: u32,
}

impl SchedulerOptions {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_unresolved_polls(mut self, max: u32) -> Self {
        self.max_unresolved_polls = max;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }
        if self.max_unresolved_polls == 0 {
            return Err(ConfigError::InvalidUnresolvedLimit);
        }
        Ok(())
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_unresolved_polls: DEFAULT_MAX_UNRESOLVED_POLLS,
        }
    }
}

/// A launched job, owned by the scheduler until it is seen finished.
struct RunningJob<H> {
    id: JobId,
    command: String,
    log_path: PathBuf,
    handle: H,
    started: Instant,
    failed_polls: u32,
}

/// Drives a batch of jobs from pending to finished under a concurrency limit.
///
/// A scheduler runs exactly one batch: `run` consumes it, so no state can
/// leak between runs.
pub struct Scheduler<B: ProcessBackend> {
    backend: B,
    options: SchedulerOptions,
    queue: JobQueue,
    running: Vec<RunningJob<B::Handle>>,
    finished: Vec<ScheduleResult>,
}

impl<B: ProcessBackend> Scheduler<B> {
    pub fn new(backend: B, options: SchedulerOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            backend,
            options,
            queue: JobQueue::default(),
            running: Vec::new(),
            finished: Vec::new(),
        })
    }

    /// Run every job to completion. Results are in completion order.
    pub async fn run(self, jobs: Vec<JobDescriptor>) -> Vec<ScheduleResult> {
        self.run_streaming(jobs, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_event` as each job starts and
    /// as soon as each one is seen finished.
    #[tracing::instrument(skip_all, fields(jobs = jobs.len()))]
    pub async fn run_streaming<F>(mut self, jobs: Vec<JobDescriptor>, mut on_event: F) -> Vec<ScheduleResult>
    where
        F: FnMut(&SchedulerEvent),
    {
        self.queue = JobQueue::new(jobs);
        let total = self.queue.len();
        tracing::info!(total, concurrency = self.options.concurrency, "starting batch");

        loop {
            self.fill(&mut on_event).await;
            if self.finished.len() == total {
                break;
            }

            let newly_finished = self.poll(&mut on_event).await;
            if self.finished.len() == total {
                break;
            }

            if newly_finished == 0 {
                tracing::debug!(running = self.running.len(), pending = self.queue.pending(), "backing off");
                tokio::time::sleep(self.options.poll_interval).await;
            }
        }

        tracing::info!(total, "batch complete");
        self.finished
    }

    async fn fill<F: FnMut(&SchedulerEvent)>(&mut self, on_event: &mut F) {
        while self.running.len() < self.options.concurrency && self.queue.peek_next().is_some() {
            let (id, job) = match self.queue.advance() {
                Ok(next) => next,
                Err(e) => {
                    tracing::warn!("{}", e);
                    break;
                }
            };
            self.launch(id, &job, on_event).await;
        }
    }

    async fn launch<F: FnMut(&SchedulerEvent)>(&mut self, id: JobId, job: &JobDescriptor, on_event: &mut F) {
        let prepared = match prepare(id, job).await {
            Ok(prepared) => prepared,
            Err(e) => return self.launch_failed(id, job.command(), None, e, on_event),
        };

        match self.backend.spawn(&prepared).await {
            Ok(handle) => {
                tracing::info!(job = %id, command = %prepared.command, "started job");
                on_event(&SchedulerEvent::Started {
                    id,
                    command: prepared.command.clone(),
                    log_path: prepared.log_path.clone(),
                });
                self.running.push(RunningJob {
                    id,
                    command: prepared.command,
                    log_path: prepared.log_path,
                    handle,
                    started: Instant::now(),
                    failed_polls: 0,
                });
            }
            Err(e) => self.launch_failed(id, &prepared.command, Some(prepared.log_path), e, on_event),
        }
    }

    /// Record a failed launch. The slot was never taken, so the fill loop
    /// moves straight on to the next job.
    fn launch_failed<F: FnMut(&SchedulerEvent)>(
        &mut self,
        id: JobId,
        command: &str,
        log_path: Option<PathBuf>,
        err: LaunchError,
        on_event: &mut F,
    ) {
        tracing::warn!(job = %id, error = %err, "launch failed");
        self.finish(
            ScheduleResult {
                id,
                command: command.to_string(),
                elapsed: Duration::ZERO,
                outcome: JobOutcome::LaunchFailed { reason: err.to_string() },
                log_path,
            },
            on_event,
        );
    }

    /// Poll every running job once. Returns how many finished.
    async fn poll<F: FnMut(&SchedulerEvent)>(&mut self, on_event: &mut F) -> usize {
        let max_unresolved = self.options.max_unresolved_polls;
        let mut newly_finished = 0;
        let mut i = 0;

        while i < self.running.len() {
            let job = &mut self.running[i];
            let outcome = match self.backend.poll(&mut job.handle).await {
                Ok(ProcessState::Running) => {
                    job.failed_polls = 0;
                    None
                }
                Ok(ProcessState::Finished { code }) => Some(JobOutcome::Exited { code }),
                Err(e) => unresolved_outcome(job, e, max_unresolved),
            };

            match outcome {
                Some(outcome) => {
                    let job = self.running.remove(i);
                    let result = ScheduleResult {
                        id: job.id,
                        command: job.command,
                        elapsed: job.started.elapsed(),
                        outcome,
                        log_path: Some(job.log_path),
                    };
                    tracing::info!(
                        job = %result.id,
                        elapsed_minutes = result.elapsed_minutes(),
                        outcome = %result.outcome,
                        "finished job"
                    );
                    self.finish(result, on_event);
                    newly_finished += 1;
                }
                None => i += 1,
            }
        }

        newly_finished
    }

    fn finish<F: FnMut(&SchedulerEvent)>(&mut self, result: ScheduleResult, on_event: &mut F) {
        on_event(&SchedulerEvent::Finished(result.clone()));
        self.finished.push(result);
    }
}

/// A failed poll leaves the job running until `max` failures in a row.
fn unresolved_outcome<H>(job: &mut RunningJob<H>, err: PollError, max: u32) -> Option<JobOutcome> {
    job.failed_polls += 1;
    tracing::warn!(job = %job.id, attempt = job.failed_polls, max, error = %err, "poll failed");

    if job.failed_polls >= max {
        Some(JobOutcome::Unresolved {
            reason: format!("{} ({} consecutive failures)", err, job.failed_polls),
        })
    } else {
        None
    }
}

/// Build a batch from plain command lines and run it on a fresh scheduler.
///
/// All configuration is validated before anything is spawned.
pub async fn run_commands<B: ProcessBackend>(
    backend: B,
    commands: &[String],
    working_dirs: Option<&[String]>,
    output_dir: &Path,
    options: SchedulerOptions,
) -> Result<Vec<ScheduleResult>, ConfigError> {
    let jobs = build_jobs(commands, working_dirs, output_dir)?;
    let scheduler = Scheduler::new(backend, options)?;
    Ok(scheduler.run(jobs).await)
}
