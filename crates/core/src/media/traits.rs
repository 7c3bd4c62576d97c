//! Trait definitions for the media module.

use async_trait::async_trait;
use std::path::Path;

use super::error::MediaError;
use super::probe::VideoInfo;
use super::Frame;

/// A decoded video, read one frame at a time.
#[async_trait]
pub trait FrameSource: Send {
    /// Metadata learned when the source was opened.
    fn info(&self) -> &VideoInfo;

    /// Reads the next frame. `Ok(None)` means the stream is exhausted.
    async fn next_frame(&mut self) -> Result<Option<Frame>, MediaError>;

    /// Releases the underlying decoder.
    async fn close(&mut self) -> Result<(), MediaError>;
}

/// A raw video encoder accepting frames of a fixed size.
#[async_trait]
pub trait FrameSink: Send {
    /// Encodes one frame.
    async fn write_frame(&mut self, frame: &Frame) -> Result<(), MediaError>;

    /// Flushes and closes the output file.
    async fn finish(&mut self) -> Result<(), MediaError>;
}

/// Opens frame sources and sinks and reads/writes still images.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Returns the name of this backend implementation.
    fn name(&self) -> &str;

    /// Opens a video for frame-by-frame decoding.
    async fn open_video(&self, path: &Path) -> Result<Box<dyn FrameSource>, MediaError>;

    /// Creates a raw video file at `path` that accepts `width`x`height` frames.
    async fn create_video(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        fps: f64,
    ) -> Result<Box<dyn FrameSink>, MediaError>;

    /// Decodes a single still image.
    async fn read_image(&self, path: &Path) -> Result<Frame, MediaError>;

    /// Encodes a still image, picking the format from the path's extension.
    async fn write_image(&self, path: &Path, frame: &Frame) -> Result<(), MediaError>;

    /// Validates that the backend is properly configured and ready.
    async fn validate(&self) -> Result<(), MediaError> {
        Ok(())
    }
}
