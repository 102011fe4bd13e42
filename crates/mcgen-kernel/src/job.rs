//! Batch construction and per-job working-directory setup.

use std::path::{Path, PathBuf};

use chrono::Utc;
use mcgen_types::{ConfigError, JobDescriptor, JobId, LaunchError};

/// A job whose working directory exists and whose log path is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedJob {
    pub id: JobId,
    pub command: String,
    pub working_dir: PathBuf,
    pub log_path: PathBuf,
}

/// Build the job list for a batch of commands.
///
/// Working directories default to `run_<index>`. Relative directories are
/// placed under `output_dir`, which is made absolute. Nothing is created on
/// disk here.
pub fn build_jobs(
    commands: &[String],
    working_dirs: Option<&[String]>,
    output_dir: &Path,
) -> Result<Vec<JobDescriptor>, ConfigError> {
    if let Some(dirs) = working_dirs
        && dirs.len() != commands.len()
    {
        return Err(ConfigError::LengthMismatch {
            commands: commands.len(),
            working_dirs: dirs.len(),
        });
    }

    let output_dir = std::path::absolute(output_dir).map_err(|e| ConfigError::OutputDir {
        path: output_dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let jobs = commands
        .iter()
        .enumerate()
        .map(|(index, command)| {
            let dir = match working_dirs {
                Some(dirs) => output_dir.join(&dirs[index]),
                None => output_dir.join(format!("run_{}", index)),
            };
            JobDescriptor::new(command.clone(), dir)
        })
        .collect();

    Ok(jobs)
}

/// Create the job's working directory and settle its log path.
///
/// Called when the job is dequeued, right before launch. Without an explicit
/// log path the log is `<working_dir>/<unix millis>_<id>.log`, so jobs
/// sharing a directory never share a log.
pub async fn prepare(id: JobId, job: &JobDescriptor) -> Result<PreparedJob, LaunchError> {
    let working_dir = job.working_dir().to_path_buf();
    create_dir(&working_dir).await?;

    let log_path = match job.log_path() {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                create_dir(parent).await?;
            }
            path.to_path_buf()
        }
        None => working_dir.join(format!("{}_{}.log", Utc::now().timestamp_millis(), id)),
    };

    Ok(PreparedJob {
        id,
        command: job.command().to_string(),
        working_dir,
        log_path,
    })
}

async fn create_dir(path: &Path) -> Result<(), LaunchError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| LaunchError::WorkingDirectory {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
