//! Single-image path.

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::annotator::{annotate_timed, Annotator};
use crate::job::{JobError, LatencyLog};
use crate::media::MediaBackend;
use crate::metrics;

/// Annotates one still image and writes it straight to its final location.
pub struct ImagePipeline {
    media: Arc<dyn MediaBackend>,
    annotator: Arc<dyn Annotator>,
}

impl ImagePipeline {
    pub fn new(media: Arc<dyn MediaBackend>, annotator: Arc<dyn Annotator>) -> Self {
        Self { media, annotator }
    }

    /// Returns a log holding the single annotation latency.
    pub async fn run(&self, input: &Path, output: &Path) -> Result<LatencyLog, JobError> {
        let frame = self.media.read_image(input).await?;
        let record = annotate_timed(self.annotator.as_ref(), frame).await?;

        metrics::FRAMES_ANNOTATED.inc();
        metrics::INFERENCE_LATENCY.observe(record.latency.as_secs_f64());

        self.media.write_image(output, &record.frame).await?;
        debug!(
            "Annotated image {} -> {} in {:?}",
            input.display(),
            output.display(),
            record.latency
        );

        let mut log = LatencyLog::new();
        log.record(record.latency);
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::AnnotatorError;
    use crate::testing::{MockAnnotator, MockMediaBackend};
    use std::path::PathBuf;
    use std::time::Duration;

    #[tokio::test]
    async fn test_image_is_annotated_once() {
        let media = MockMediaBackend::new();
        let annotator = MockAnnotator::new();
        annotator.set_delay(Duration::from_millis(10)).await;
        let pipeline = ImagePipeline::new(Arc::new(media.clone()), Arc::new(annotator.clone()));

        let log = pipeline
            .run(Path::new("photo.png"), Path::new("results/photo.png"))
            .await
            .unwrap();

        assert_eq!(log.len(), 1);
        assert!(log.samples()[0] >= Duration::from_millis(10));
        assert_eq!(annotator.call_count().await, 1);
        assert_eq!(
            media.written_images().await,
            vec![PathBuf::from("results/photo.png")]
        );
        assert!(media.created_videos().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_image_is_decode_error() {
        let media = MockMediaBackend::new();
        media.mark_unreadable("photo.png").await;
        let annotator = MockAnnotator::new();
        let pipeline = ImagePipeline::new(Arc::new(media.clone()), Arc::new(annotator.clone()));

        let err = pipeline
            .run(Path::new("photo.png"), Path::new("out.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Decode(_)));
        assert_eq!(annotator.call_count().await, 0);
        assert!(media.written_images().await.is_empty());
    }

    #[tokio::test]
    async fn test_directory_input_is_decode_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("photo.png");
        std::fs::create_dir(&input).unwrap();
        let annotator = MockAnnotator::new();
        let pipeline = ImagePipeline::new(
            Arc::new(crate::media::FfmpegMediaBackend::with_defaults()),
            Arc::new(annotator.clone()),
        );

        let err = pipeline
            .run(&input, &dir.path().join("out.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Decode(_)), "got {:?}", err);
        assert!(err.to_string().starts_with("Decode error"));
        assert_eq!(annotator.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_annotator_error_skips_write() {
        let media = MockMediaBackend::new();
        let annotator = MockAnnotator::new();
        annotator
            .set_next_error(AnnotatorError::Timeout)
            .await;
        let pipeline = ImagePipeline::new(Arc::new(media.clone()), Arc::new(annotator));

        let err = pipeline
            .run(Path::new("photo.jpg"), Path::new("out.jpg"))
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Annotation(AnnotatorError::Timeout)));
        assert!(media.written_images().await.is_empty());
    }
}
