//! Handle to a submitted job.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::job::{JobSnapshot, JobState};

/// Returned by [`super::JobOrchestrator::submit`].
///
/// Dropping the handle detaches the job; it keeps running and its outcome
/// stays visible through the orchestrator's snapshot.
#[derive(Debug)]
pub struct JobHandle {
    job_id: String,
    cancelled: Arc<AtomicBool>,
    state: JobState,
    task: JoinHandle<JobSnapshot>,
}

impl JobHandle {
    pub(crate) fn new(
        job_id: String,
        cancelled: Arc<AtomicBool>,
        state: JobState,
        task: JoinHandle<JobSnapshot>,
    ) -> Self {
        Self {
            job_id,
            cancelled,
            state,
            task,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Asks the job to stop. Takes effect at the next frame boundary, or
    /// before the final encode; the job then ends as failed.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            info!("Cancellation requested for job {}", self.job_id);
        }
    }

    /// Waits for the job to reach a terminal state and returns that snapshot.
    pub async fn wait(self) -> JobSnapshot {
        match self.task.await {
            Ok(snapshot) => snapshot,
            Err(_) => self.state.snapshot(),
        }
    }

    /// Whether the job task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
