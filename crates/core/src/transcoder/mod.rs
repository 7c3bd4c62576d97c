//! Transcoder module for the final encode of annotated videos.
//!
//! The frame pipeline writes a raw intermediate file that plays poorly in
//! browsers. The `Transcoder` re-encodes it into a broadly compatible codec
//! at a fixed quality, copying audio streams as they are.
//!
//! # Example
//!
//! ```ignore
//! use vidmark_core::transcoder::{FfmpegTranscoder, Transcoder};
//!
//! let transcoder = FfmpegTranscoder::with_defaults();
//! transcoder.validate().await?;
//!
//! let outcome = transcoder
//!     .transcode(Path::new("/tmp/raw.mp4"), Path::new("results/clip.mp4"))
//!     .await?;
//! println!("Transcoded in {} ms", outcome.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscoderError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::TranscodeOutcome;
