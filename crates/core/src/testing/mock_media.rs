//! Mock media backend for testing.

use async_trait::async_trait;
use image::Rgb;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::{Frame, FrameSink, FrameSource, MediaBackend, MediaError, VideoInfo};

/// A raw video created through the mock, for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVideo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Frames written so far.
    pub frames_written: u64,
    /// Whether `finish` was called.
    pub finished: bool,
}

/// Shape of the synthetic video every `open_video` call returns.
#[derive(Debug, Clone)]
struct VideoScript {
    frames: u64,
    reported_frame_count: Option<u64>,
    width: u32,
    height: u32,
    decode_error_after: Option<u64>,
}

impl Default for VideoScript {
    fn default() -> Self {
        Self {
            frames: 10,
            reported_frame_count: Some(10),
            width: 16,
            height: 12,
            decode_error_after: None,
        }
    }
}

/// Mock implementation of the MediaBackend trait.
///
/// Provides controllable behavior for testing:
/// - Synthetic videos with a configurable frame count and size
/// - Metadata that can disagree with the real frame count
/// - Decode failures at open time or mid-stream
/// - Recorded encoders and written images
///
/// Nothing touches the filesystem unless `set_touch_files(true)` is called,
/// in which case created videos and written images become real (empty)
/// files so cleanup can be asserted.
///
/// # Example
///
/// ```rust,ignore
/// use vidmark_core::testing::MockMediaBackend;
///
/// let media = MockMediaBackend::new();
/// media.set_video(30, 64, 48).await;
///
/// // ... run a pipeline ...
///
/// let videos = media.created_videos().await;
/// assert_eq!(videos[0].frames_written, 30);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockMediaBackend {
    script: Arc<RwLock<VideoScript>>,
    unreadable: Arc<RwLock<HashSet<PathBuf>>>,
    videos: Arc<RwLock<Vec<RecordedVideo>>>,
    images: Arc<RwLock<Vec<PathBuf>>>,
    closed_sources: Arc<RwLock<usize>>,
    touch_files: Arc<RwLock<bool>>,
}

impl MockMediaBackend {
    /// Create a new mock backend producing 10 frames of 16x12.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number and size of frames each opened video yields.
    pub async fn set_video(&self, frames: u64, width: u32, height: u32) {
        let mut script = self.script.write().await;
        script.frames = frames;
        script.reported_frame_count = Some(frames);
        script.width = width;
        script.height = height;
    }

    /// Override the frame count advertised by the container metadata.
    pub async fn set_reported_frame_count(&self, count: Option<u64>) {
        self.script.write().await.reported_frame_count = count;
    }

    /// Fail the read that follows `frames` successful reads.
    pub async fn set_decode_error_after(&self, frames: Option<u64>) {
        self.script.write().await.decode_error_after = frames;
    }

    /// Make opening or reading `path` fail with a decode error.
    ///
    /// A bare file name matches that name in any directory.
    pub async fn mark_unreadable(&self, path: impl AsRef<Path>) {
        self.unreadable
            .write()
            .await
            .insert(path.as_ref().to_path_buf());
    }

    /// Create real files for encoders and written images.
    pub async fn set_touch_files(&self, touch: bool) {
        *self.touch_files.write().await = touch;
    }

    /// Get all raw videos created so far.
    pub async fn created_videos(&self) -> Vec<RecordedVideo> {
        self.videos.read().await.clone()
    }

    /// Get the paths of all written images.
    pub async fn written_images(&self) -> Vec<PathBuf> {
        self.images.read().await.clone()
    }

    /// Number of frame sources that were closed.
    pub async fn closed_sources(&self) -> usize {
        *self.closed_sources.read().await
    }

    /// Clear recorded videos, images and counters.
    pub async fn clear_recorded(&self) {
        self.videos.write().await.clear();
        self.images.write().await.clear();
        *self.closed_sources.write().await = 0;
    }

    async fn check_readable(&self, path: &Path) -> Result<(), MediaError> {
        let unreadable = self.unreadable.read().await;
        let by_name = path.file_name().map(Path::new);
        if unreadable.contains(path) || by_name.is_some_and(|name| unreadable.contains(name)) {
            return Err(MediaError::decode(path, "mock: unreadable input"));
        }
        Ok(())
    }

    async fn touch(&self, path: &Path) -> Result<(), MediaError> {
        if !*self.touch_files.read().await {
            return Ok(());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, b"mock media").await?;
        Ok(())
    }
}

#[async_trait]
impl MediaBackend for MockMediaBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open_video(&self, path: &Path) -> Result<Box<dyn FrameSource>, MediaError> {
        self.check_readable(path).await?;
        let script = self.script.read().await.clone();

        Ok(Box::new(MockFrameSource {
            path: path.to_path_buf(),
            info: VideoInfo {
                width: script.width,
                height: script.height,
                frame_count: script.reported_frame_count,
                fps: Some(30.0),
                duration_secs: None,
            },
            remaining: script.frames,
            produced: 0,
            decode_error_after: script.decode_error_after,
            closed_sources: Arc::clone(&self.closed_sources),
            closed: false,
        }))
    }

    async fn create_video(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        fps: f64,
    ) -> Result<Box<dyn FrameSink>, MediaError> {
        self.touch(path).await?;

        let mut videos = self.videos.write().await;
        videos.push(RecordedVideo {
            path: path.to_path_buf(),
            width,
            height,
            fps,
            frames_written: 0,
            finished: false,
        });

        Ok(Box::new(MockFrameSink {
            index: videos.len() - 1,
            videos: Arc::clone(&self.videos),
        }))
    }

    async fn read_image(&self, path: &Path) -> Result<Frame, MediaError> {
        self.check_readable(path).await?;
        let script = self.script.read().await;
        Ok(Frame::from_pixel(script.width, script.height, Rgb([40, 80, 120])))
    }

    async fn write_image(&self, path: &Path, _frame: &Frame) -> Result<(), MediaError> {
        self.touch(path).await?;
        self.images.write().await.push(path.to_path_buf());
        Ok(())
    }
}

struct MockFrameSource {
    path: PathBuf,
    info: VideoInfo,
    remaining: u64,
    produced: u64,
    decode_error_after: Option<u64>,
    closed_sources: Arc<RwLock<usize>>,
    closed: bool,
}

#[async_trait]
impl FrameSource for MockFrameSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, MediaError> {
        if self.decode_error_after == Some(self.produced) {
            return Err(MediaError::decode(&self.path, "mock: corrupt frame"));
        }
        if self.remaining == 0 {
            return Ok(None);
        }

        self.remaining -= 1;
        self.produced += 1;
        let shade = (self.produced % 256) as u8;
        Ok(Some(Frame::from_pixel(
            self.info.width,
            self.info.height,
            Rgb([shade, shade, shade]),
        )))
    }

    async fn close(&mut self) -> Result<(), MediaError> {
        if !self.closed {
            self.closed = true;
            *self.closed_sources.write().await += 1;
        }
        Ok(())
    }
}

struct MockFrameSink {
    index: usize,
    videos: Arc<RwLock<Vec<RecordedVideo>>>,
}

#[async_trait]
impl FrameSink for MockFrameSink {
    async fn write_frame(&mut self, frame: &Frame) -> Result<(), MediaError> {
        let mut videos = self.videos.write().await;
        let video = &mut videos[self.index];
        if frame.dimensions() != (video.width, video.height) {
            return Err(MediaError::encode(&video.path, "mock: frame size mismatch"));
        }
        if video.finished {
            return Err(MediaError::encode(&video.path, "mock: encoder already finished"));
        }
        video.frames_written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), MediaError> {
        self.videos.write().await[self.index].finished = true;
        Ok(())
    }
}
