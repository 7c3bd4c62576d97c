//! Single-slot job state shared between the running job and pollers.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;

use super::error::SubmitError;
use super::types::{JobSnapshot, JobStatus};

/// The one job slot of the process.
///
/// Every mutation swaps in a whole new snapshot under the channel's lock, so
/// a reader never observes a half-applied update (e.g. `completed` with a
/// stale percentage). Transitions are checked: only a processing job can
/// progress, complete or fail, and only the job that owns the slot can touch
/// it.
#[derive(Debug, Clone)]
pub struct JobState {
    tx: Arc<watch::Sender<JobSnapshot>>,
}

impl Default for JobState {
    fn default() -> Self {
        Self::new()
    }
}

impl JobState {
    /// Creates an idle slot.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(JobSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> JobSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.tx.subscribe()
    }

    /// Whether a job currently holds the slot.
    pub fn is_busy(&self) -> bool {
        self.tx.borrow().status == JobStatus::Processing
    }

    /// Claims the slot for a new job, wiping everything the previous job left.
    pub(crate) fn try_begin(&self, job_id: &str, subject_name: &str) -> Result<(), SubmitError> {
        let mut busy: Option<SubmitError> = None;

        self.tx.send_if_modified(|snapshot| {
            if snapshot.status == JobStatus::Processing {
                busy = Some(SubmitError::Busy {
                    job_id: snapshot.job_id.clone().unwrap_or_default(),
                    subject_name: snapshot.subject_name.clone().unwrap_or_default(),
                });
                return false;
            }

            *snapshot = JobSnapshot {
                job_id: Some(job_id.to_string()),
                status: JobStatus::Processing,
                percent_complete: 0,
                subject_name: Some(subject_name.to_string()),
                average_inference_seconds: None,
                error: None,
                started_at: Some(Utc::now()),
                finished_at: None,
            };
            true
        });

        match busy {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Raises the job's progress. Lower values are ignored.
    pub(crate) fn set_progress(&self, job_id: &str, percent: u8) -> bool {
        let percent = percent.min(100);
        self.tx.send_if_modified(|snapshot| {
            if !Self::owns(snapshot, job_id) || percent <= snapshot.percent_complete {
                return false;
            }
            snapshot.percent_complete = percent;
            true
        })
    }

    /// Moves the job to completed with its final average latency.
    ///
    /// Returns the terminal snapshot, or `None` if `job_id` does not own a
    /// processing slot.
    pub(crate) fn complete(
        &self,
        job_id: &str,
        average_inference_seconds: f64,
    ) -> Option<JobSnapshot> {
        self.finish(job_id, |snapshot| {
            snapshot.status = JobStatus::Completed;
            snapshot.percent_complete = 100;
            snapshot.average_inference_seconds = Some(average_inference_seconds);
        })
    }

    /// Moves the job to failed, keeping the reason for pollers.
    pub(crate) fn fail(&self, job_id: &str, reason: impl Into<String>) -> Option<JobSnapshot> {
        let reason = reason.into();
        self.finish(job_id, |snapshot| {
            snapshot.status = JobStatus::Failed;
            snapshot.error = Some(reason);
        })
    }

    fn finish(
        &self,
        job_id: &str,
        apply: impl FnOnce(&mut JobSnapshot),
    ) -> Option<JobSnapshot> {
        let mut terminal = None;
        self.tx.send_if_modified(|snapshot| {
            if !Self::owns(snapshot, job_id) {
                return false;
            }
            apply(snapshot);
            snapshot.finished_at = Some(Utc::now());
            terminal = Some(snapshot.clone());
            true
        });
        terminal
    }

    fn owns(snapshot: &JobSnapshot, job_id: &str) -> bool {
        snapshot.status == JobStatus::Processing && snapshot.job_id.as_deref() == Some(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = JobState::new();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, JobStatus::Idle);
        assert!(snapshot.job_id.is_none());
        assert!(!state.is_busy());
    }

    #[test]
    fn test_begin_resets_slot() {
        let state = JobState::new();
        state.try_begin("a", "first.mp4").unwrap();
        state.set_progress("a", 70);
        state.complete("a", 0.25).unwrap();

        state.try_begin("b", "second.png").unwrap();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.job_id.as_deref(), Some("b"));
        assert_eq!(snapshot.status, JobStatus::Processing);
        assert_eq!(snapshot.percent_complete, 0);
        assert_eq!(snapshot.subject_name.as_deref(), Some("second.png"));
        assert!(snapshot.average_inference_seconds.is_none());
        assert!(snapshot.finished_at.is_none());
    }

    #[test]
    fn test_begin_rejected_while_processing() {
        let state = JobState::new();
        state.try_begin("a", "first.mp4").unwrap();

        let err = state.try_begin("b", "second.mp4").unwrap_err();
        match err {
            SubmitError::Busy {
                job_id,
                subject_name,
            } => {
                assert_eq!(job_id, "a");
                assert_eq!(subject_name, "first.mp4");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(state.snapshot().job_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_progress_never_decreases() {
        let state = JobState::new();
        state.try_begin("a", "clip.mp4").unwrap();

        assert!(state.set_progress("a", 40));
        assert!(!state.set_progress("a", 30));
        assert!(!state.set_progress("a", 40));
        assert_eq!(state.snapshot().percent_complete, 40);

        assert!(state.set_progress("a", 250));
        assert_eq!(state.snapshot().percent_complete, 100);
    }

    #[test]
    fn test_complete_forces_full_progress() {
        let state = JobState::new();
        state.try_begin("a", "clip.mp4").unwrap();
        state.set_progress("a", 99);

        let terminal = state.complete("a", 0.031).unwrap();
        assert_eq!(terminal, state.snapshot());
        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.percent_complete, 100);
        assert_eq!(snapshot.average_inference_seconds, Some(0.031));
        assert!(snapshot.finished_at.is_some());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let state = JobState::new();
        state.try_begin("a", "clip.mp4").unwrap();
        assert!(state.fail("a", "boom").is_some());

        assert!(state.complete("a", 1.0).is_none());
        assert!(!state.set_progress("a", 50));
        assert!(state.fail("a", "again").is_none());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("boom"));
        assert!(snapshot.average_inference_seconds.is_none());
    }

    #[test]
    fn test_stale_job_cannot_touch_new_job() {
        let state = JobState::new();
        state.try_begin("a", "first.mp4").unwrap();
        state.complete("a", 0.1).unwrap();
        state.try_begin("b", "second.mp4").unwrap();

        assert!(!state.set_progress("a", 80));
        assert!(state.fail("a", "late failure").is_none());
        assert_eq!(state.snapshot().status, JobStatus::Processing);
        assert_eq!(state.snapshot().percent_complete, 0);
    }

    #[test]
    fn test_idle_slot_rejects_transitions() {
        let state = JobState::new();
        assert!(!state.set_progress("a", 10));
        assert!(state.complete("a", 0.0).is_none());
        assert_eq!(state.snapshot().status, JobStatus::Idle);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let state = JobState::new();
        let mut rx = state.subscribe();

        state.try_begin("a", "clip.mp4").unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status, JobStatus::Processing);

        state.set_progress("a", 10);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().percent_complete, 10);
    }
}
