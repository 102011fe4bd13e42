//! Integration tests running real `sh` processes through the scheduler.
//!
//! These tests verify:
//! - every submitted job gets exactly one result
//! - the concurrency limit holds while slots are backfilled
//! - launch failures are reported per job without stopping the batch
//! - elapsed times track how long the process actually ran

use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};

use mcgen_kernel::{
    build_jobs, run_commands, ConfigError, JobDescriptor, JobId, JobOutcome, LocalBackend,
    ScheduleResult, Scheduler, SchedulerEvent, SchedulerOptions,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn fast(concurrency: usize) -> SchedulerOptions {
    SchedulerOptions::new(concurrency).with_poll_interval(Duration::from_millis(20))
}

fn commands(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

fn ids(results: &[ScheduleResult]) -> BTreeSet<usize> {
    results.iter().map(|r| r.id.0).collect()
}

fn scheduler(concurrency: usize) -> Scheduler<LocalBackend> {
    Scheduler::new(LocalBackend::new(), fast(concurrency)).expect("valid options")
}

fn batch(dir: &Path, lines: &[&str]) -> Vec<JobDescriptor> {
    build_jobs(&commands(lines), None, dir).expect("valid batch")
}

// ============================================================================
// Scheduling
// ============================================================================

#[tokio::test]
async fn serial_batch_yields_one_result_per_job() {
    let tmp = tempfile::tempdir().unwrap();
    let mut running = 0usize;
    let mut max_running = 0usize;

    let results = scheduler(1)
        .run_streaming(batch(tmp.path(), &["true", "true", "true", "true"]), |event| {
            match event {
                SchedulerEvent::Started { .. } => running += 1,
                SchedulerEvent::Finished(_) => running -= 1,
            }
            max_running = max_running.max(running);
        })
        .await;

    assert_eq!(results.len(), 4);
    assert_eq!(ids(&results), (0..4).collect());
    assert!(results.iter().all(|r| r.ok()), "{:?}", results);
    assert_eq!(max_running, 1);
}

#[tokio::test]
async fn five_jobs_two_slots() {
    let tmp = tempfile::tempdir().unwrap();
    let mut running = 0usize;
    let mut max_running = 0usize;
    let mut started = Vec::new();

    let lines = ["sleep 0.3", "sleep 0.1", "sleep 0.2", "sleep 0.1", "true"];
    let results = scheduler(2)
        .run_streaming(batch(tmp.path(), &lines), |event| match event {
            SchedulerEvent::Started { id, .. } => {
                started.push(*id);
                running += 1;
                max_running = max_running.max(running);
            }
            SchedulerEvent::Finished(_) => running -= 1,
        })
        .await;

    assert_eq!(results.len(), 5);
    assert_eq!(ids(&results), (0..5).collect());
    assert_eq!(max_running, 2);
    // Jobs are launched in submission order even though they finish out of it
    assert_eq!(started, (0..5).map(JobId).collect::<Vec<_>>());
}

#[tokio::test]
async fn empty_batch_returns_immediately() {
    let opts = SchedulerOptions::new(4).with_poll_interval(Duration::from_secs(30));
    let scheduler = Scheduler::new(LocalBackend::new(), opts).unwrap();

    let start = Instant::now();
    let results = scheduler.run(Vec::new()).await;
    assert!(results.is_empty());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn elapsed_tracks_process_runtime() {
    let tmp = tempfile::tempdir().unwrap();
    let results = scheduler(1).run(batch(tmp.path(), &["sleep 1"])).await;

    let elapsed = results[0].elapsed;
    assert!(elapsed >= Duration::from_millis(950), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1600), "elapsed {:?}", elapsed);
    assert!((results[0].elapsed_minutes() - 1.0 / 60.0).abs() < 0.01);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn missing_executable_is_launch_error_for_that_job_only() {
    let tmp = tempfile::tempdir().unwrap();
    let lines = ["true", "definitely_not_a_real_command_12345 --events 100", "true"];
    let results = scheduler(2).run(batch(tmp.path(), &lines)).await;

    assert_eq!(ids(&results), (0..3).collect());
    for result in &results {
        if result.id == JobId(1) {
            match &result.outcome {
                JobOutcome::LaunchFailed { reason } => {
                    assert!(reason.contains("command not found"), "{}", reason)
                }
                other => panic!("expected launch failure, got {:?}", other),
            }
        } else {
            assert!(result.ok(), "{:?}", result);
        }
    }
}

#[tokio::test]
async fn failing_command_is_exited_not_launch_error() {
    let tmp = tempfile::tempdir().unwrap();
    let results = scheduler(1).run(batch(tmp.path(), &["exit 2"])).await;
    assert_eq!(results[0].outcome, JobOutcome::Exited { code: Some(2) });
    assert!(results[0].exit_observed());
}

#[tokio::test]
async fn mismatched_dirs_fail_before_anything_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let cmds = commands(&["touch ran_a", "touch ran_b"]);
    let dirs = commands(&["a"]);

    let err = run_commands(LocalBackend::new(), &cmds, Some(dirs.as_slice()), tmp.path(), fast(2))
        .await
        .unwrap_err();

    assert_eq!(err, ConfigError::LengthMismatch { commands: 2, working_dirs: 1 });
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

// ============================================================================
// Filesystem side effects
// ============================================================================

#[tokio::test]
async fn output_lands_in_log_inside_working_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let cmds = commands(&["echo generated; echo warning >&2; touch events.hepmc"]);
    let dirs = commands(&["pt_10_20"]);

    let results = run_commands(LocalBackend::new(), &cmds, Some(dirs.as_slice()), tmp.path(), fast(1))
        .await
        .unwrap();

    let workdir = tmp.path().join("pt_10_20");
    assert!(workdir.join("events.hepmc").exists());

    let log_path = results[0].log_path.as_ref().expect("log path recorded");
    assert_eq!(log_path.parent(), Some(workdir.as_path()));
    let log = std::fs::read_to_string(log_path).unwrap();
    assert!(log.contains("generated"));
    assert!(log.contains("warning"));
}

#[tokio::test]
async fn explicit_log_path_is_used() {
    let tmp = tempfile::tempdir().unwrap();
    let log = tmp.path().join("logs/custom.log");
    let job = JobDescriptor::new("echo hello", tmp.path().join("run_0")).with_log_path(&log);

    let results = scheduler(1).run(vec![job]).await;
    assert_eq!(results[0].log_path.as_deref(), Some(log.as_path()));
    assert_eq!(std::fs::read_to_string(&log).unwrap().trim(), "hello");
}
