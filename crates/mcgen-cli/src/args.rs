//! Command-line argument handling for `mcgenstudy run`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Options for a production run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    /// File with one command line per job.
    pub commands_file: PathBuf,
    /// File with one working-directory name per job.
    pub dirs_file: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

/// Parse the arguments that follow `run`.
pub fn parse_run_args(args: &[String]) -> Result<RunArgs> {
    let mut parsed = RunArgs::default();
    let mut commands_file = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };

        let mut value = |name: &str| -> Result<String> {
            match inline.clone() {
                Some(v) => Ok(v),
                None => iter.next().cloned().with_context(|| format!("{} requires a value", name)),
            }
        };

        match flag {
            "-j" | "--jobs" => {
                let v = value(flag)?;
                let jobs = v
                    .parse::<usize>()
                    .with_context(|| format!("invalid job count: {}", v))?;
                parsed.jobs = Some(jobs);
            }
            "--dirs" => parsed.dirs_file = Some(PathBuf::from(value(flag)?)),
            "--output-dir" | "-o" => parsed.output_dir = Some(PathBuf::from(value(flag)?)),
            "--config" => parsed.config = Some(PathBuf::from(value(flag)?)),
            "--json" => parsed.json = true,
            other if other.starts_with('-') => bail!("unknown run option: {}", other),
            path => {
                if commands_file.is_some() {
                    bail!("unexpected argument: {}", path);
                }
                commands_file = Some(PathBuf::from(path));
            }
        }
    }

    parsed.commands_file = commands_file.context("run requires a commands file")?;
    Ok(parsed)
}

/// Read a list file: one entry per line, blank lines and `#` comments skipped.
pub fn read_list(path: &std::path::Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
