//! Human-readable progress lines and the end-of-run summary.

use mcgen_kernel::{ScheduleResult, SchedulerEvent};

/// One progress line per scheduler event.
pub fn progress_line(label: &str, event: &SchedulerEvent) -> String {
    match event {
        SchedulerEvent::Started { id, command, .. } => {
            format!("[{}] started job {}: {}", label, id, command)
        }
        SchedulerEvent::Finished(result) => format!(
            "[{}] finished job {}, elapsed {:.2} minutes, {}",
            label,
            result.id,
            result.elapsed_minutes(),
            result.outcome
        ),
    }
}

/// Counts for the closing summary line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_results(results: &[ScheduleResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.ok()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }

    pub fn all_ok(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} jobs, {} succeeded, {} failed", self.total, self.succeeded, self.failed)
    }
}
