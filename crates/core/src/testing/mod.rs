//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the media backend, annotator
//! and transcoder traits so jobs can run end to end without ffmpeg or a
//! detection model.
//!
//! # Example
//!
//! ```rust,ignore
//! use vidmark_core::testing::{MockAnnotator, MockMediaBackend, MockTranscoder};
//!
//! let media = MockMediaBackend::new();
//! let annotator = MockAnnotator::new();
//! let transcoder = MockTranscoder::new();
//!
//! // Configure mock behavior
//! media.set_video(30, 64, 48).await;
//! annotator.set_delay(Duration::from_millis(5)).await;
//!
//! // Use in a JobOrchestrator...
//! ```

mod mock_annotator;
mod mock_media;
mod mock_transcoder;

pub use mock_annotator::{MockAnnotator, MOCK_MARKER};
pub use mock_media::{MockMediaBackend, RecordedVideo};
pub use mock_transcoder::{MockTranscoder, RecordedTranscode};
