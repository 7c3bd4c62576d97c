//! Job orchestrator implementation.
//!
//! Drives one job at a time from submission to a terminal state:
//! - Image: annotate once, write directly to the output path
//! - Video: frame pipeline into a raw intermediate file, then the final
//!   encode, then removal of the intermediate file

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::annotator::Annotator;
use crate::job::{JobContext, JobError, JobSnapshot, JobState, LatencyLog, SubmitError};
use crate::media::{MediaBackend, MediaKind};
use crate::metrics;
use crate::pipeline::{ImagePipeline, PipelineConfig, VideoPipeline};
use crate::transcoder::Transcoder;

use super::handle::JobHandle;
use super::temp::TempArtifact;

/// The job orchestrator - owns the job slot and runs submitted jobs.
pub struct JobOrchestrator {
    media: Arc<dyn MediaBackend>,
    annotator: Arc<dyn Annotator>,
    transcoder: Arc<dyn Transcoder>,
    pipeline_config: PipelineConfig,
    temp_dir: PathBuf,
    state: JobState,
}

impl JobOrchestrator {
    /// Creates an orchestrator with an idle job slot.
    pub fn new(
        media: Arc<dyn MediaBackend>,
        annotator: Arc<dyn Annotator>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            media,
            annotator,
            transcoder,
            pipeline_config: PipelineConfig::default(),
            temp_dir: std::env::temp_dir().join("vidmark"),
            state: JobState::new(),
        }
    }

    /// Sets the directory for intermediate raw videos.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn with_pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = config;
        self
    }

    /// Uses an existing job slot instead of a fresh one.
    pub fn with_state(mut self, state: JobState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Returns the current job snapshot.
    pub fn snapshot(&self) -> JobSnapshot {
        self.state.snapshot()
    }

    /// Subscribes to job snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.state.subscribe()
    }

    /// Path of the intermediate raw video for a job.
    pub fn temp_path_for(&self, job_id: &str, output_name: &str) -> PathBuf {
        self.temp_dir.join(format!("{}_{}", job_id, output_name))
    }

    /// Submits a job and returns immediately.
    ///
    /// The job runs on its own task. Fails with [`SubmitError::Busy`] while
    /// another job is processing. Must be called from within a tokio runtime.
    pub fn submit(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<JobHandle, SubmitError> {
        let input = input.as_ref().to_path_buf();
        let output = output.as_ref().to_path_buf();

        let subject_name = file_name(&input)
            .ok_or_else(|| SubmitError::InvalidInput(format!("no file name in {}", input.display())))?;
        let output_name = file_name(&output).ok_or_else(|| {
            SubmitError::InvalidInput(format!("no file name in {}", output.display()))
        })?;

        let kind = MediaKind::from_path(&input);
        let job_id = Uuid::new_v4().to_string();

        if let Err(e) = self.state.try_begin(&job_id, &subject_name) {
            metrics::JOBS_REJECTED.inc();
            warn!("Rejected submission of {}: {}", subject_name, e);
            return Err(e);
        }

        info!(
            "Starting {} job {} for {}",
            kind.as_str(),
            job_id,
            subject_name
        );

        let cancelled = Arc::new(AtomicBool::new(false));
        let ctx = JobContext::new(job_id.clone(), self.state.clone(), Arc::clone(&cancelled));
        let work = JobWork {
            kind,
            temp_path: self.temp_path_for(&job_id, &output_name),
            temp_dir: self.temp_dir.clone(),
            input,
            output,
            media: Arc::clone(&self.media),
            annotator: Arc::clone(&self.annotator),
            transcoder: Arc::clone(&self.transcoder),
            pipeline_config: self.pipeline_config.clone(),
        };

        let task = tokio::spawn(supervise(work, ctx, self.state.clone()));
        Ok(JobHandle::new(job_id, cancelled, self.state.clone(), task))
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Runs the job on a nested task so a panic still ends in a terminal state.
async fn supervise(work: JobWork, ctx: JobContext, state: JobState) -> JobSnapshot {
    let started = Instant::now();
    let kind = work.kind;
    let job_id = ctx.job_id().to_string();

    let inner = tokio::spawn(async move { work.run(&ctx).await });
    let outcome = match inner.await {
        Ok(result) => result,
        Err(e) => Err(JobError::Aborted(describe_join_error(e))),
    };

    metrics::JOB_DURATION
        .with_label_values(&[kind.as_str()])
        .observe(started.elapsed().as_secs_f64());

    let terminal = match outcome {
        Ok(log) => {
            let average = log.average_seconds();
            metrics::JOBS_TOTAL
                .with_label_values(&[kind.as_str(), "completed"])
                .inc();
            info!(
                "Job {} completed: {} frames, average inference {:.3}s",
                job_id,
                log.len(),
                average
            );
            state.complete(&job_id, average)
        }
        Err(e) => {
            metrics::JOBS_TOTAL
                .with_label_values(&[kind.as_str(), "failed"])
                .inc();
            match &e {
                JobError::Cancelled => info!("Job {} cancelled", job_id),
                other => error!("Job {} failed ({}): {}", job_id, other.kind(), other),
            }
            state.fail(&job_id, e.to_string())
        }
    };

    terminal.unwrap_or_else(|| state.snapshot())
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return "job task was cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "job task panicked".to_string()
    }
}

/// Everything one job needs, moved onto its task.
struct JobWork {
    kind: MediaKind,
    input: PathBuf,
    output: PathBuf,
    temp_dir: PathBuf,
    temp_path: PathBuf,
    media: Arc<dyn MediaBackend>,
    annotator: Arc<dyn Annotator>,
    transcoder: Arc<dyn Transcoder>,
    pipeline_config: PipelineConfig,
}

impl JobWork {
    async fn run(self, ctx: &JobContext) -> Result<LatencyLog, JobError> {
        match self.kind {
            MediaKind::Image => {
                ImagePipeline::new(Arc::clone(&self.media), Arc::clone(&self.annotator))
                    .run(&self.input, &self.output)
                    .await
            }
            MediaKind::Video => self.run_video(ctx).await,
        }
    }

    async fn run_video(&self, ctx: &JobContext) -> Result<LatencyLog, JobError> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let artifact = TempArtifact::new(&self.temp_path);

        let pipeline = VideoPipeline::new(
            Arc::clone(&self.media),
            Arc::clone(&self.annotator),
            self.pipeline_config.clone(),
        );

        let result: Result<LatencyLog, JobError> = async {
            let log = pipeline.run(&self.input, artifact.path(), ctx).await?;
            ctx.check_cancelled()?;
            self.transcode(artifact.path()).await?;
            Ok(log)
        }
        .await;

        artifact.remove().await;
        result
    }

    async fn transcode(&self, raw_path: &Path) -> Result<(), JobError> {
        let start = Instant::now();
        debug!(
            "Handing {} to {} transcoder",
            raw_path.display(),
            self.transcoder.name()
        );

        match self.transcoder.transcode(raw_path, &self.output).await {
            Ok(outcome) => {
                metrics::TRANSCODE_DURATION
                    .with_label_values(&["success"])
                    .observe(start.elapsed().as_secs_f64());
                info!(
                    "Transcoded {} ({} bytes) in {} ms",
                    outcome.output_path.display(),
                    outcome.output_size_bytes,
                    outcome.duration_ms
                );
                Ok(())
            }
            Err(e) => {
                metrics::TRANSCODE_DURATION
                    .with_label_values(&["failed"])
                    .observe(start.elapsed().as_secs_f64());
                remove_partial_output(&self.output).await;
                Err(e.into())
            }
        }
    }
}

async fn remove_partial_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::AnnotatorError;
    use crate::job::JobStatus;
    use crate::media::Frame;
    use crate::testing::{MockAnnotator, MockMediaBackend, MockTranscoder};
    use crate::transcoder::TranscoderError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct PanickingAnnotator;

    #[async_trait]
    impl Annotator for PanickingAnnotator {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn annotate(&self, _frame: Frame) -> Result<Frame, AnnotatorError> {
            panic!("model crashed");
        }
    }

    #[test]
    fn test_temp_path_layout() {
        let orchestrator = JobOrchestrator::new(
            Arc::new(MockMediaBackend::new()),
            Arc::new(MockAnnotator::new()),
            Arc::new(MockTranscoder::new()),
        )
        .with_temp_dir("/scratch");

        assert_eq!(
            orchestrator.temp_path_for("abc", "clip.mp4"),
            PathBuf::from("/scratch/abc_clip.mp4")
        );
    }

    #[tokio::test]
    async fn test_submit_without_file_name_is_invalid() {
        let orchestrator = JobOrchestrator::new(
            Arc::new(MockMediaBackend::new()),
            Arc::new(MockAnnotator::new()),
            Arc::new(MockTranscoder::new()),
        );

        let err = orchestrator.submit("/", "out.mp4").unwrap_err();
        assert!(matches!(err, SubmitError::InvalidInput(_)));
        assert_eq!(orchestrator.snapshot().status, JobStatus::Idle);
    }

    #[tokio::test]
    async fn test_panic_in_job_ends_as_failed() {
        let dir = TempDir::new().unwrap();
        let media = MockMediaBackend::new();
        media.set_touch_files(true).await;
        let orchestrator = JobOrchestrator::new(
            Arc::new(media),
            Arc::new(PanickingAnnotator),
            Arc::new(MockTranscoder::new()),
        )
        .with_temp_dir(dir.path().join("tmp"));

        let handle = orchestrator
            .submit(dir.path().join("clip.mp4"), dir.path().join("out.mp4"))
            .unwrap();
        let job_id = handle.job_id().to_string();
        let snapshot = handle.wait().await;

        assert_eq!(snapshot.status, JobStatus::Failed);
        assert!(snapshot.error.unwrap().contains("model crashed"));
        assert!(!orchestrator.state().is_busy());
        assert!(!orchestrator.temp_path_for(&job_id, "out.mp4").exists());
    }

    #[tokio::test]
    async fn test_transcode_failure_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let media = MockMediaBackend::new();
        media.set_touch_files(true).await;
        let transcoder = MockTranscoder::new();
        transcoder
            .set_next_error(TranscoderError::failed("encoder crashed", None))
            .await;

        let output = dir.path().join("out.mp4");
        std::fs::write(&output, b"partial").unwrap();

        let orchestrator = JobOrchestrator::new(
            Arc::new(media),
            Arc::new(MockAnnotator::new()),
            Arc::new(transcoder),
        )
        .with_temp_dir(dir.path().join("tmp"));

        let snapshot = orchestrator
            .submit(dir.path().join("clip.mp4"), &output)
            .unwrap()
            .wait()
            .await;

        assert_eq!(snapshot.status, JobStatus::Failed);
        assert!(snapshot.error.unwrap().contains("encoder crashed"));
        assert!(!output.exists());
    }
}
