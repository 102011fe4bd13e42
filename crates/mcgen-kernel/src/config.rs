//! Configuration for mcgenstudy.
//!
//! Configuration is loaded from `~/.config/mcgenstudy/config.toml`.
//! Command-line flags override individual fields.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::backend::{LocalBackend, DEFAULT_SHELL};
use crate::merge::MergeSettings;
use crate::scheduler::{SchedulerOptions, DEFAULT_MAX_UNRESOLVED_POLLS, DEFAULT_POLL_INTERVAL};

/// Configuration for a study run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Parent directory of every job's working directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Number of production jobs run in parallel.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Sleep between liveness polls when nothing finished, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_max_unresolved_polls")]
    pub max_unresolved_polls: u32,

    /// Shell used to interpret job command lines.
    #[serde(default = "default_shell")]
    pub shell: PathBuf,

    /// Merge pass run after production, if configured.
    #[serde(default)]
    pub merge: Option<MergeSettings>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("mcgen_output")
}

fn default_jobs() -> usize {
    1
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_max_unresolved_polls() -> u32 {
    DEFAULT_MAX_UNRESOLVED_POLLS
}

fn default_shell() -> PathBuf {
    PathBuf::from(DEFAULT_SHELL)
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            jobs: default_jobs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_unresolved_polls: default_max_unresolved_polls(),
            shell: default_shell(),
            merge: None,
        }
    }
}

impl StudyConfig {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the default config file path.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "mcgenstudy")
            .context("Could not determine config directory")?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Scheduler tuning for the production batch.
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions::new(self.jobs)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_max_unresolved_polls(self.max_unresolved_polls)
    }

    pub fn backend(&self) -> LocalBackend {
        LocalBackend::new().with_shell(&self.shell)
    }
}
