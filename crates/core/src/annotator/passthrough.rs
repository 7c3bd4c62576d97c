//! Annotator that returns frames untouched.

use async_trait::async_trait;

use crate::media::Frame;

use super::error::AnnotatorError;
use super::traits::Annotator;

/// Returns every frame unchanged.
///
/// Lets the whole pipeline run (decode, encode, transcode, progress) without
/// a detection service, which is handy for smoke tests and for measuring
/// pipeline overhead on its own.
#[derive(Debug, Clone, Default)]
pub struct PassthroughAnnotator;

#[async_trait]
impl Annotator for PassthroughAnnotator {
    fn name(&self) -> &str {
        "passthrough"
    }

    async fn annotate(&self, frame: Frame) -> Result<Frame, AnnotatorError> {
        Ok(frame)
    }
}
