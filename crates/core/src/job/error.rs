//! Error types for the job module.

use thiserror::Error;

use crate::annotator::AnnotatorError;
use crate::media::MediaError;
use crate::transcoder::TranscoderError;

/// Why a job ended in the failed state.
#[derive(Debug, Error)]
pub enum JobError {
    /// Input cannot be read as an image or video.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The annotator failed on a frame.
    #[error("Annotation error: {0}")]
    Annotation(#[from] AnnotatorError),

    /// The final encode failed.
    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscoderError),

    /// Writing an intermediate or output file failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The job was cancelled through its handle.
    #[error("cancelled")]
    Cancelled,

    /// The job task panicked.
    #[error("Job aborted unexpectedly: {0}")]
    Aborted(String),
}

impl JobError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Annotation(_) => "annotation",
            Self::Transcode(_) => "transcode",
            Self::Io(_) => "io",
            Self::Cancelled => "cancelled",
            Self::Aborted(_) => "aborted",
        }
    }
}

impl From<MediaError> for JobError {
    fn from(err: MediaError) -> Self {
        match err {
            // Keep the io message bare, `JobError::Io` adds its own prefix
            MediaError::Io(io) => Self::Io(io.to_string()),
            other if other.is_input_error() => Self::Decode(other.to_string()),
            other => Self::Io(other.to_string()),
        }
    }
}

impl From<std::io::Error> for JobError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Why a submission was refused.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Another job is still processing.
    #[error("A job is already processing: {subject_name} ({job_id})")]
    Busy {
        job_id: String,
        subject_name: String,
    },

    /// The submitted paths are unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
