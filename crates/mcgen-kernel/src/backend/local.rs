//! LocalBackend: jobs as `sh -c` child processes on this machine.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use super::{ProcessBackend, ProcessState};
use crate::job::PreparedJob;
use crate::shell::{is_executable, leading_program, wrap_command};
use mcgen_types::{LaunchError, PollError};

/// Default shell used to interpret job command lines.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Runs each job as `<shell> -c '{ <command> ; } > <log> 2>&1'` in its
/// working directory.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    shell: PathBuf,
}

/// A child process started by [`LocalBackend`].
#[derive(Debug)]
pub struct LocalProcess {
    child: Child,
    pid: Option<u32>,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
        }
    }

    /// Interpret commands with a different shell.
    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Fail early when the command's program cannot be found, instead of
    /// letting the shell exit 127 inside the log file.
    ///
    /// Only programs whose lookup is certain are checked. Paths are tested
    /// relative to the working directory; plain names are resolved by the
    /// job's own shell with `command -v`, so builtins, functions and keywords
    /// of that shell all count as found.
    async fn check_program(&self, job: &PreparedJob) -> Result<(), LaunchError> {
        if job.command.trim().is_empty() {
            return Err(LaunchError::EmptyCommand);
        }

        let Some(program) = leading_program(&job.command) else {
            return Ok(());
        };

        let found = if program.contains('/') {
            is_executable(&job.working_dir.join(program))
        } else {
            self.shell_resolves(program, &job.working_dir).await?
        };

        if found {
            Ok(())
        } else {
            Err(LaunchError::CommandNotFound(program.to_string()))
        }
    }

    async fn shell_resolves(&self, program: &str, working_dir: &Path) -> Result<bool, LaunchError> {
        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(r#"command -v "$1""#)
            .arg("sh")
            .arg(program)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| LaunchError::Spawn(format!("{}: {}", self.shell.display(), e)))?;

        Ok(status.success())
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessBackend for LocalBackend {
    type Handle = LocalProcess;

    async fn spawn(&mut self, job: &PreparedJob) -> Result<LocalProcess, LaunchError> {
        self.check_program(job).await?;

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(wrap_command(&job.command, &job.log_path))
            .current_dir(&job.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd
            .spawn()
            .map_err(|e| LaunchError::Spawn(format!("{}: {}", self.shell.display(), e)))?;
        let pid = child.id();

        tracing::debug!(job = %job.id, pid, "spawned");
        Ok(LocalProcess { child, pid })
    }

    async fn poll(&mut self, handle: &mut LocalProcess) -> Result<ProcessState, PollError> {
        if let Some(status) = handle.child.try_wait()? {
            return Ok(ProcessState::Finished { code: status.code() });
        }

        let terminated = match handle.pid {
            Some(pid) => is_terminated(pid)?,
            None => false,
        };
        if !terminated {
            return Ok(ProcessState::Running);
        }

        // Exited between the two checks; collect the status if it is still there
        let code = handle.child.try_wait()?.and_then(|status| status.code());
        Ok(ProcessState::Finished { code })
    }
}

/// True if `pid` has left the process table or sits in a zombie/dead state.
///
/// `try_wait` normally reaps the child first; this only decides the case
/// where the process died between that call and this one.
#[cfg(target_os = "linux")]
fn is_terminated(pid: u32) -> Result<bool, PollError> {
    let pid = i32::try_from(pid).map_err(|e| PollError(e.to_string()))?;
    match procfs::process::Process::new(pid).and_then(|p| p.stat()) {
        Ok(stat) => Ok(matches!(stat.state, 'Z' | 'X' | 'x')),
        Err(procfs::ProcError::NotFound(_)) => Ok(true),
        Err(e) => Err(PollError(e.to_string())),
    }
}

#[cfg(not(target_os = "linux"))]
fn is_terminated(_pid: u32) -> Result<bool, PollError> {
    Ok(false)
}
