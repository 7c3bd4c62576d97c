//! Frame-by-frame video pipeline.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::annotator::{annotate_timed, Annotator};
use crate::job::{JobContext, JobError, LatencyLog};
use crate::media::{FrameSink, FrameSource, MediaBackend};
use crate::metrics;

use super::config::PipelineConfig;

/// Percentage of `processed` out of `total`, floored and clamped to 100.
pub fn percent_of(processed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (processed.saturating_mul(100) / total).min(100) as u8
}

/// Decodes a video, annotates every frame and writes the result to a raw
/// intermediate file.
pub struct VideoPipeline {
    media: Arc<dyn MediaBackend>,
    annotator: Arc<dyn Annotator>,
    config: PipelineConfig,
}

impl VideoPipeline {
    pub fn new(
        media: Arc<dyn MediaBackend>,
        annotator: Arc<dyn Annotator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            media,
            annotator,
            config,
        }
    }

    /// Runs the pipeline from `input` to the raw file at `temp_output`.
    ///
    /// Progress is reported through `ctx` after every frame when the frame
    /// count is known. The source and sink are released on every path.
    pub async fn run(
        &self,
        input: &Path,
        temp_output: &Path,
        ctx: &JobContext,
    ) -> Result<LatencyLog, JobError> {
        let mut source = self.media.open_video(input).await?;
        let info = source.info().clone();

        info!(
            "Processing video {} ({}x{}, {} frames)",
            input.display(),
            info.width,
            info.height,
            info.frame_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );

        let mut sink = match self
            .media
            .create_video(temp_output, info.width, info.height, self.config.output_fps)
            .await
        {
            Ok(sink) => sink,
            Err(e) => {
                release_source(source.as_mut(), input).await;
                return Err(e.into());
            }
        };

        let result = self
            .annotate_frames(source.as_mut(), sink.as_mut(), info.progress_total(), ctx)
            .await;

        release_source(source.as_mut(), input).await;

        match result {
            Ok(log) => {
                sink.finish().await?;
                debug!(
                    "Wrote {} annotated frames to {}",
                    log.len(),
                    temp_output.display()
                );
                Ok(log)
            }
            Err(e) => {
                if let Err(finish_err) = sink.finish().await {
                    debug!("Encoder close after failure: {}", finish_err);
                }
                Err(e)
            }
        }
    }

    async fn annotate_frames(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        total: Option<u64>,
        ctx: &JobContext,
    ) -> Result<LatencyLog, JobError> {
        let mut log = LatencyLog::new();
        let mut processed: u64 = 0;

        loop {
            ctx.check_cancelled()?;

            let frame = match source.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    // An unreadable frame ends the stream rather than the job
                    warn!("Stopping after {} frames: {}", processed, e);
                    break;
                }
            };

            let record = annotate_timed(self.annotator.as_ref(), frame).await?;
            sink.write_frame(&record.frame).await?;

            log.record(record.latency);
            metrics::FRAMES_ANNOTATED.inc();
            metrics::INFERENCE_LATENCY.observe(record.latency.as_secs_f64());

            processed += 1;
            if let Some(total) = total {
                ctx.report_progress(percent_of(processed, total));
            }
        }

        Ok(log)
    }
}

async fn release_source(source: &mut dyn FrameSource, input: &Path) {
    if let Err(e) = source.close().await {
        warn!("Failed to close decoder for {}: {}", input.display(), e);
    }
}
