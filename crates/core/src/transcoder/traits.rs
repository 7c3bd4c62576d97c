//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::Path;

use super::error::TranscoderError;
use super::types::TranscodeOutcome;

/// Normalizes a raw intermediate encoding into the final codec/container.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Re-encodes `raw_path` into `final_path`, returning once the encoder
    /// process has exited.
    async fn transcode(
        &self,
        raw_path: &Path,
        final_path: &Path,
    ) -> Result<TranscodeOutcome, TranscoderError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscoderError>;
}
