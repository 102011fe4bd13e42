//! mcgenstudy CLI entry point.
//!
//! Usage:
//!   mcgenstudy run <commands-file> [-j N]   # Run a batch of generator jobs
//!   mcgenstudy --help
//!   mcgenstudy --version

mod args;
mod report;

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mcgen_kernel::{build_jobs, plan_merge_jobs, ScheduleResult, Scheduler, StudyConfig};

use crate::args::{parse_run_args, read_list, RunArgs};
use crate::report::{progress_line, Summary};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None | Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Some("--version" | "-V") => {
            println!("mcgenstudy {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }

        Some("run") => {
            let run_args = parse_run_args(&args[2..])?;
            run_study(run_args)
        }

        Some(unknown) => {
            eprintln!("Unknown command: {unknown}");
            eprintln!("Run 'mcgenstudy --help' for usage.");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_help() {
    println!(r#"mcgenstudy v{}

Usage:
  mcgenstudy run <commands-file> [OPTIONS]   Run one job per command line

Run Options:
  -j, --jobs <N>             Number of jobs run in parallel (default: 1)
  --dirs <file>              Working-directory names, one per command
                             (default: run_<index>)
  -o, --output-dir <dir>     Parent of all working directories
                             (default: mcgen_output)
  --config <file>            Config file (default: ~/.config/mcgenstudy/config.toml)
  --json                     Print results as JSON when done

Options:
  -h, --help                 Show this help
  -V, --version              Show version

Each job runs as `{{ <command> ; }} > <log> 2>&1` inside its working directory.
If the config has a [merge] section, merge jobs run once every job has finished.
"#, env!("CARGO_PKG_VERSION"));
}

/// Run the production batch, then the merge batch if one is configured.
fn run_study(args: RunArgs) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => StudyConfig::load_from(path)?,
        None => StudyConfig::load()?,
    };
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    tracing::debug!(?config, "effective configuration");

    let commands = read_list(&args.commands_file)?;
    let dirs = args.dirs_file.as_deref().map(read_list).transpose()?;

    // Everything is validated before the first process starts
    let jobs = build_jobs(&commands, dirs.as_deref(), &config.output_dir)
        .context("Invalid job list")?;
    let options = config.scheduler_options();
    let scheduler = Scheduler::new(config.backend(), options.clone())
        .context("Invalid scheduler configuration")?;

    let rt = tokio::runtime::Runtime::new()?;

    let results = rt.block_on(scheduler.run_streaming(jobs.clone(), |event| {
        println!("{}", progress_line("production", event));
    }));
    let production = Summary::from_results(&results);
    println!("production: {}", production);

    let mut all_ok = production.all_ok();
    let mut merged = Vec::new();

    if let Some(merge) = config.merge.as_ref().filter(|m| !m.groups.is_empty()) {
        let output_dir = std::path::absolute(&config.output_dir)
            .with_context(|| format!("Failed to resolve {}", config.output_dir.display()))?;
        let merge_jobs = plan_merge_jobs(merge, &jobs, &results, &output_dir)
            .context("Failed to plan merge jobs")?;
        let scheduler = Scheduler::new(config.backend(), merge.scheduler_options(&options))
            .context("Invalid merge configuration")?;

        merged = rt.block_on(scheduler.run_streaming(merge_jobs, |event| {
            println!("{}", progress_line("merge", event));
        }));
        let summary = Summary::from_results(&merged);
        println!("merge: {}", summary);
        all_ok &= summary.all_ok();
    }

    if args.json {
        print_json(&results, &merged)?;
    }

    Ok(if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_json(production: &[ScheduleResult], merge: &[ScheduleResult]) -> Result<()> {
    let report = serde_json::json!({
        "production": production,
        "merge": merge,
    });
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize results")?;
    println!("{}", json);
    Ok(())
}
