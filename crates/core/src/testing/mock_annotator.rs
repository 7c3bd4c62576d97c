//! Mock annotator for testing.

use async_trait::async_trait;
use image::Rgb;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::annotator::{Annotator, AnnotatorError};
use crate::media::Frame;

/// Color the mock paints in the top-left pixel of every annotated frame.
pub const MOCK_MARKER: Rgb<u8> = Rgb([255, 0, 0]);

/// Mock implementation of the Annotator trait.
///
/// Provides controllable behavior for testing:
/// - Count annotation calls
/// - Simulate inference latency
/// - Fail once, or fail every call after the first `n`
#[derive(Debug, Clone, Default)]
pub struct MockAnnotator {
    calls: Arc<RwLock<usize>>,
    delay: Arc<RwLock<Duration>>,
    next_error: Arc<RwLock<Option<AnnotatorError>>>,
    fail_after: Arc<RwLock<Option<usize>>>,
}

impl MockAnnotator {
    /// Create a new mock annotator with no delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of annotate calls so far.
    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }

    /// Set the simulated inference time per frame.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: AnnotatorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fail every call after the first `calls` succeed.
    pub async fn set_fail_after(&self, calls: Option<usize>) {
        *self.fail_after.write().await = calls;
    }

    /// Clear the call counter.
    pub async fn clear_recorded(&self) {
        *self.calls.write().await = 0;
    }
}

#[async_trait]
impl Annotator for MockAnnotator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn annotate(&self, mut frame: Frame) -> Result<Frame, AnnotatorError> {
        let call = {
            let mut calls = self.calls.write().await;
            *calls += 1;
            *calls
        };

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if let Some(limit) = *self.fail_after.read().await {
            if call > limit {
                return Err(AnnotatorError::Failed(format!(
                    "mock: failing call {}",
                    call
                )));
            }
        }

        if frame.width() > 0 && frame.height() > 0 {
            frame.put_pixel(0, 0, MOCK_MARKER);
        }
        Ok(frame)
    }
}
