//! Error types for the annotator module.

use thiserror::Error;

/// Errors returned by an annotator.
#[derive(Debug, Error)]
pub enum AnnotatorError {
    /// Could not reach the detection service.
    #[error("Annotator connection failed: {0}")]
    ConnectionFailed(String),

    /// The detection service did not answer in time.
    #[error("Annotator request timed out")]
    Timeout,

    /// The detection service answered with a non-success status.
    #[error("Annotator returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response could not be decoded as an image.
    #[error("Invalid annotator response: {0}")]
    InvalidResponse(String),

    /// The frame could not be encoded for the request.
    #[error("Failed to encode frame: {0}")]
    Encode(String),

    /// The model rejected or failed on the frame.
    #[error("Annotation failed: {0}")]
    Failed(String),
}

impl AnnotatorError {
    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::ConnectionFailed(_))
    }
}
