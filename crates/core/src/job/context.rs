//! Per-job context handed to the pipelines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::JobError;
use super::state::JobState;

/// What a running pipeline needs to know about its job: who it is, where to
/// report progress, and whether it should stop.
#[derive(Debug, Clone)]
pub struct JobContext {
    job_id: String,
    state: JobState,
    cancelled: Arc<AtomicBool>,
}

impl JobContext {
    pub(crate) fn new(job_id: impl Into<String>, state: JobState, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            job_id: job_id.into(),
            state,
            cancelled,
        }
    }

    /// Creates a context that is not tied to any cancellation handle.
    pub fn detached(job_id: impl Into<String>, state: JobState) -> Self {
        Self::new(job_id, state, Arc::new(AtomicBool::new(false)))
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Publishes progress. Returns false if the value was not an increase.
    pub fn report_progress(&self, percent: u8) -> bool {
        self.state.set_progress(&self.job_id, percent)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `Err(JobError::Cancelled)` once cancellation was requested.
    pub fn check_cancelled(&self) -> Result<(), JobError> {
        if self.is_cancelled() {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_progress_updates_state() {
        let state = JobState::new();
        state.try_begin("job-1", "clip.mp4").unwrap();
        let ctx = JobContext::detached("job-1", state.clone());

        assert!(ctx.report_progress(25));
        assert!(!ctx.report_progress(10));
        assert_eq!(state.snapshot().percent_complete, 25);
    }

    #[test]
    fn test_cancellation_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = JobContext::new("job-1", JobState::new(), flag.clone());
        tokio_test::assert_ok!(ctx.check_cancelled());

        flag.store(true, Ordering::SeqCst);
        assert!(ctx.is_cancelled());
        let err = tokio_test::assert_err!(ctx.check_cancelled());
        assert!(matches!(err, JobError::Cancelled));
    }
}
