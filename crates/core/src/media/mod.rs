//! Media decoding and encoding.
//!
//! This module classifies uploads into videos and still images and provides
//! the `MediaBackend` trait the pipelines read frames from and write frames to:
//!
//! - Videos are decoded frame by frame into packed RGB buffers and the
//!   annotated frames are written to a raw intermediate encoding at a fixed
//!   frame rate.
//! - Still images are decoded and encoded whole.
//!
//! `FfmpegMediaBackend` is the production implementation.

mod error;
mod ffmpeg;
mod kind;
mod probe;
mod still;
mod traits;

pub use error::MediaError;
pub use ffmpeg::FfmpegMediaBackend;
pub use kind::{output_file_name, MediaKind, VIDEO_EXTENSIONS, VIDEO_OUTPUT_EXTENSION};
pub use probe::VideoInfo;
pub use still::{read_image, write_image};
pub use traits::{FrameSink, FrameSource, MediaBackend};

/// A decoded frame: packed 8-bit RGB pixels.
pub type Frame = image::RgbImage;
