//! The job queue: submitted jobs handed out in their original order.

use mcgen_types::{JobDescriptor, JobId, QueueError};

/// Ordered sequence of pending jobs with a launch cursor.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Vec<JobDescriptor>,
    cursor: usize,
}

impl JobQueue {
    pub fn new(jobs: Vec<JobDescriptor>) -> Self {
        Self { jobs, cursor: 0 }
    }

    /// The next unlaunched job, without consuming it.
    pub fn peek_next(&self) -> Option<(JobId, &JobDescriptor)> {
        self.jobs.get(self.cursor).map(|job| (JobId(self.cursor), job))
    }

    /// Mark the head as launched and move past it.
    pub fn advance(&mut self) -> Result<(JobId, JobDescriptor), QueueError> {
        let job = self.jobs.get(self.cursor).cloned().ok_or(QueueError::Exhausted)?;
        let id = JobId(self.cursor);
        self.cursor += 1;
        Ok((id, job))
    }

    /// Total number of submitted jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs not yet handed out.
    pub fn pending(&self) -> usize {
        self.jobs.len() - self.cursor
    }
}
