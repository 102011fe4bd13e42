//! Post-processing merge planning.
//!
//! Once a production batch has fully finished, each merge group gathers
//! the artifacts matching its pattern from every production working
//! directory and becomes one merge job. The merge jobs are then run as an
//! ordinary second batch, usually with a different concurrency limit.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::glob::glob_match;
use crate::scheduler::SchedulerOptions;
use crate::shell::shell_quote;
use mcgen_types::{ConfigError, JobDescriptor, JobId, JobOutcome, ScheduleResult};

/// A grouping key and the file-name pattern its artifacts match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeGroup {
    pub name: String,
    pub pattern: String,
}

impl MergeGroup {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() || self.name == "." || self.name == ".." || self.name.contains('/') {
            return Err(ConfigError::InvalidMergeGroup(format!("bad group name {:?}", self.name)));
        }
        if self.pattern.is_empty() {
            return Err(ConfigError::InvalidMergeGroup(format!("group {} has an empty pattern", self.name)));
        }
        Ok(())
    }
}

/// How merge jobs are built and run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Command template. `{inputs}`, `{output}` and `{group}` are replaced
    /// with shell-quoted values.
    #[serde(default = "default_command")]
    pub command: String,

    /// Concurrency limit for the merge batch.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Extension of the merged artifact, `<output_dir>/<group>.<extension>`.
    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default)]
    pub groups: Vec<MergeGroup>,
}

fn default_command() -> String {
    "yodamerge -o {output} {inputs}".to_string()
}

fn default_jobs() -> usize {
    1
}

fn default_extension() -> String {
    "yoda".to_string()
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            jobs: default_jobs(),
            extension: default_extension(),
            groups: Vec::new(),
        }
    }
}

impl MergeSettings {
    /// Options for the merge batch: production tuning, merge concurrency.
    pub fn scheduler_options(&self, production: &SchedulerOptions) -> SchedulerOptions {
        SchedulerOptions {
            concurrency: self.jobs,
            ..production.clone()
        }
    }

    fn render(&self, group: &MergeGroup, inputs: &[PathBuf], output: &Path) -> String {
        let inputs = inputs
            .iter()
            .map(|p| shell_quote(&p.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ");

        self.command
            .replace("{inputs}", &inputs)
            .replace("{output}", &shell_quote(&output.to_string_lossy()))
            .replace("{group}", &shell_quote(&group.name))
    }
}

/// Plan one merge job per group that has at least one artifact.
///
/// Refuses unless every production job has a result: artifacts of a job
/// that is merely launched may still be being written. For the same reason
/// the directories of `Unresolved` jobs, whose exit was never observed, are
/// left out of the search.
pub fn plan_merge_jobs(
    settings: &MergeSettings,
    production: &[JobDescriptor],
    results: &[ScheduleResult],
    output_dir: &Path,
) -> Result<Vec<JobDescriptor>, ConfigError> {
    ensure_finished(production.len(), results)?;
    for group in &settings.groups {
        group.validate()?;
    }

    let unresolved: BTreeSet<JobId> = results
        .iter()
        .filter(|r| matches!(r.outcome, JobOutcome::Unresolved { .. }))
        .map(|r| r.id)
        .collect();
    for id in &unresolved {
        if let Some(job) = production.get(id.index()) {
            tracing::warn!(job = %id, dir = %job.working_dir().display(), "exit never observed, not merging its artifacts");
        }
    }
    let dirs: Vec<&Path> = production
        .iter()
        .enumerate()
        .filter(|(index, _)| !unresolved.contains(&JobId(*index)))
        .map(|(_, job)| job.working_dir())
        .collect();

    let mut jobs = Vec::new();
    for group in &settings.groups {
        let inputs = collect_artifacts(dirs.iter().copied(), &group.pattern);
        if inputs.is_empty() {
            tracing::warn!(group = %group.name, pattern = %group.pattern, "no artifacts to merge");
            continue;
        }

        let output = output_dir.join(format!("{}.{}", group.name, settings.extension));
        tracing::info!(group = %group.name, inputs = inputs.len(), output = %output.display(), "planned merge");
        jobs.push(JobDescriptor::new(
            settings.render(group, &inputs, &output),
            output_dir.join(format!("merge_{}", group.name)),
        ));
    }

    Ok(jobs)
}

fn ensure_finished(submitted: usize, results: &[ScheduleResult]) -> Result<(), ConfigError> {
    let finished: BTreeSet<usize> = results
        .iter()
        .map(|r| r.id.0)
        .filter(|&i| i < submitted)
        .collect();

    if finished.len() == submitted {
        Ok(())
    } else {
        Err(ConfigError::ProductionIncomplete {
            finished: finished.len(),
            submitted,
        })
    }
}

/// Files directly inside `dirs` whose names match `pattern`, sorted.
///
/// Directories that do not exist (a job that never launched) are skipped.
pub fn collect_artifacts<'a>(dirs: impl IntoIterator<Item = &'a Path>, pattern: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file && glob_match(pattern, &entry.file_name().to_string_lossy()) {
                found.push(entry.path());
            }
        }
    }
    found.sort();
    found
}
