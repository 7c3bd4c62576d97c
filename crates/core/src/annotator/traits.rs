//! Trait definitions for the annotator module.

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::media::Frame;

use super::error::AnnotatorError;

/// An object-detection model that draws its detections onto a frame.
#[async_trait]
pub trait Annotator: Send + Sync {
    /// Returns the name of this annotator implementation.
    fn name(&self) -> &str;

    /// Runs detection on `frame` and returns the annotated copy.
    async fn annotate(&self, frame: Frame) -> Result<Frame, AnnotatorError>;
}

/// An annotated frame and how long the annotator took to produce it.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub frame: Frame,
    pub latency: Duration,
}

/// Runs the annotator once, measuring wall-clock latency around the call.
pub async fn annotate_timed(
    annotator: &dyn Annotator,
    frame: Frame,
) -> Result<FrameRecord, AnnotatorError> {
    let start = Instant::now();
    let frame = annotator.annotate(frame).await?;
    let latency = start.elapsed();

    Ok(FrameRecord { frame, latency })
}
