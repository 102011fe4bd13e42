//! Test utilities for backend module.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ProcessBackend, ProcessState};
use crate::job::PreparedJob;
use mcgen_types::{JobId, LaunchError, PollError};

/// What the fake backend observed.
#[derive(Debug, Default)]
pub struct FakeStats {
    /// Successful spawns, in launch order.
    pub spawned: Vec<JobId>,
    /// Spawn attempts, including ones that failed.
    pub spawn_attempts: usize,
    /// Processes currently live from the backend's point of view.
    pub live: usize,
    /// Highest `live` ever reached.
    pub max_live: usize,
    pub polls: usize,
}

#[derive(Debug, Clone)]
struct Script {
    running_polls: usize,
    code: i32,
    launch_error: Option<LaunchError>,
    poll_errors: usize,
}

/// Scripted process backend. Each job reports `Running` for a set number
/// of polls, then `Finished`. No OS processes are created.
pub struct FakeBackend {
    default_script: Script,
    scripts: HashMap<usize, Script>,
    stats: Arc<Mutex<FakeStats>>,
}

pub struct FakeProcess {
    polls_left: usize,
    poll_errors_left: usize,
    code: i32,
}

impl FakeBackend {
    /// Every job runs for `running_polls` polls and exits 0 unless scripted.
    pub fn new(running_polls: usize) -> (Self, Arc<Mutex<FakeStats>>) {
        let stats = Arc::new(Mutex::new(FakeStats::default()));
        let backend = Self {
            default_script: Script {
                running_polls,
                code: 0,
                launch_error: None,
                poll_errors: 0,
            },
            scripts: HashMap::new(),
            stats: stats.clone(),
        };
        (backend, stats)
    }

    fn script(&mut self, index: usize) -> &mut Script {
        let default = self.default_script.clone();
        self.scripts.entry(index).or_insert(default)
    }

    pub fn finish_after(mut self, index: usize, running_polls: usize) -> Self {
        self.script(index).running_polls = running_polls;
        self
    }

    pub fn exit_code(mut self, index: usize, code: i32) -> Self {
        self.script(index).code = code;
        self
    }

    pub fn fail_launch(mut self, index: usize) -> Self {
        self.script(index).launch_error = Some(LaunchError::CommandNotFound("fake".to_string()));
        self
    }

    /// The first `count` polls of this job fail. `usize::MAX` fails forever.
    pub fn fail_polls(mut self, index: usize, count: usize) -> Self {
        self.script(index).poll_errors = count;
        self
    }
}

#[async_trait]
impl ProcessBackend for FakeBackend {
    type Handle = FakeProcess;

    async fn spawn(&mut self, job: &PreparedJob) -> Result<FakeProcess, LaunchError> {
        let script = self
            .scripts
            .get(&job.id.0)
            .cloned()
            .unwrap_or_else(|| self.default_script.clone());

        let mut stats = self.stats.lock().unwrap();
        stats.spawn_attempts += 1;
        if let Some(err) = script.launch_error {
            return Err(err);
        }

        stats.spawned.push(job.id);
        stats.live += 1;
        stats.max_live = stats.max_live.max(stats.live);

        Ok(FakeProcess {
            polls_left: script.running_polls,
            poll_errors_left: script.poll_errors,
            code: script.code,
        })
    }

    async fn poll(&mut self, handle: &mut FakeProcess) -> Result<ProcessState, PollError> {
        let mut stats = self.stats.lock().unwrap();
        stats.polls += 1;

        if handle.poll_errors_left > 0 {
            if handle.poll_errors_left != usize::MAX {
                handle.poll_errors_left -= 1;
            }
            return Err(PollError("simulated process table error".to_string()));
        }

        if handle.polls_left == 0 {
            stats.live -= 1;
            return Ok(ProcessState::Finished { code: Some(handle.code) });
        }

        handle.polls_left -= 1;
        Ok(ProcessState::Running)
    }
}
