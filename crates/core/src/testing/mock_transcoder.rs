//! Mock transcoder for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::transcoder::{TranscodeOutcome, Transcoder, TranscoderError};

/// A recorded transcode call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTranscode {
    pub raw_path: PathBuf,
    pub final_path: PathBuf,
    /// Whether the raw file existed on disk when the call was made.
    pub raw_existed: bool,
    pub success: bool,
}

/// Mock implementation of the Transcoder trait.
///
/// Provides controllable behavior for testing:
/// - Track transcode calls for assertions
/// - Simulate success/failure
/// - Simulate encode time
///
/// A successful call writes a small placeholder at `final_path`.
#[derive(Debug, Clone, Default)]
pub struct MockTranscoder {
    transcodes: Arc<RwLock<Vec<RecordedTranscode>>>,
    next_error: Arc<RwLock<Option<TranscoderError>>>,
    delay: Arc<RwLock<Duration>>,
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded transcode calls.
    pub async fn recorded_transcodes(&self) -> Vec<RecordedTranscode> {
        self.transcodes.read().await.clone()
    }

    /// Get the number of transcode calls.
    pub async fn transcode_count(&self) -> usize {
        self.transcodes.read().await.len()
    }

    /// Configure the next transcode to fail with the given error.
    pub async fn set_next_error(&self, error: TranscoderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated encode duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.transcodes.write().await.clear();
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(
        &self,
        raw_path: &Path,
        final_path: &Path,
    ) -> Result<TranscodeOutcome, TranscoderError> {
        let start = Instant::now();
        let raw_existed = tokio::fs::try_exists(raw_path).await.unwrap_or(false);

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let error = self.next_error.write().await.take();
        self.transcodes.write().await.push(RecordedTranscode {
            raw_path: raw_path.to_path_buf(),
            final_path: final_path.to_path_buf(),
            raw_existed,
            success: error.is_none(),
        });
        if let Some(err) = error {
            return Err(err);
        }

        let contents = b"mock transcode";
        if raw_existed {
            if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(final_path, contents).await?;
        }

        Ok(TranscodeOutcome {
            output_path: final_path.to_path_buf(),
            output_size_bytes: contents.len() as u64,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        Ok(())
    }
}
