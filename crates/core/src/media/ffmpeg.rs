//! FFmpeg-based frame source and raw frame sink.
//!
//! Decoding pipes `rawvideo`/`rgb24` frames out of an ffmpeg child process;
//! encoding pipes them into another one. Both children are killed when the
//! handle is dropped, so an early return never leaks a process.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::MediaError;
use super::probe::{parse_probe_output, VideoInfo};
use super::still;
use super::traits::{FrameSink, FrameSource, MediaBackend};
use super::Frame;

/// Codec of the intermediate encoding (MPEG-4 Part 2, the "mp4v" fourcc).
const RAW_VIDEO_CODEC: &str = "mpeg4";

/// Media backend that shells out to ffmpeg/ffprobe for video and uses the
/// `image` crate for stills.
#[derive(Debug, Clone)]
pub struct FfmpegMediaBackend {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl FfmpegMediaBackend {
    /// Creates a backend using the given binaries.
    pub fn new(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Creates a backend resolving ffmpeg/ffprobe from `PATH`.
    pub fn with_defaults() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }

    /// Probes a video file for its first video stream.
    pub async fn probe(&self, path: &Path) -> Result<VideoInfo, MediaError> {
        if !path.exists() {
            return Err(MediaError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::FfprobeNotFound {
                        path: self.ffprobe_path.clone(),
                    }
                } else {
                    MediaError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(MediaError::probe_failed(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(path, &stdout)
    }

    /// Builds ffmpeg arguments for decoding to packed RGB24 on stdout.
    fn build_decode_args(input_path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            // Keep frames at the probed dimensions
            "-noautorotate".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "pipe:1".to_string(),
        ]
    }

    /// Builds ffmpeg arguments for encoding RGB24 frames read from stdin.
    fn build_encode_args(output_path: &Path, width: u32, height: u32, fps: f64) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "-s".to_string(),
            format!("{}x{}", width, height),
            "-r".to_string(),
            fps.to_string(),
            "-i".to_string(),
            "pipe:0".to_string(),
            "-c:v".to_string(),
            RAW_VIDEO_CODEC.to_string(),
            "-q:v".to_string(),
            "2".to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    fn spawn_error(&self, e: std::io::Error) -> MediaError {
        if e.kind() == std::io::ErrorKind::NotFound {
            MediaError::FfmpegNotFound {
                path: self.ffmpeg_path.clone(),
            }
        } else {
            MediaError::Io(e)
        }
    }
}

#[async_trait]
impl MediaBackend for FfmpegMediaBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn open_video(&self, path: &Path) -> Result<Box<dyn FrameSource>, MediaError> {
        let info = self.probe(path).await?;
        debug!(
            "Opening {} ({}x{}, {:?} frames)",
            path.display(),
            info.width,
            info.height,
            info.frame_count
        );

        let mut child = Command::new(&self.ffmpeg_path)
            .args(Self::build_decode_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::decode(path, "decoder stdout not captured"))?;

        Ok(Box::new(FfmpegFrameSource {
            path: path.to_path_buf(),
            info,
            child,
            stdout: Some(stdout),
        }))
    }

    async fn create_video(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        fps: f64,
    ) -> Result<Box<dyn FrameSink>, MediaError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut child = Command::new(&self.ffmpeg_path)
            .args(Self::build_encode_args(path, width, height, fps))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::encode(path, "encoder stdin not captured"))?;

        // Drain stderr concurrently so a chatty encoder never blocks on a full pipe
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        Ok(Box::new(FfmpegFrameSink {
            path: path.to_path_buf(),
            width,
            height,
            child,
            stdin: Some(stdin),
            stderr_task,
            finished: false,
        }))
    }

    async fn read_image(&self, path: &Path) -> Result<Frame, MediaError> {
        still::read_image(path).await
    }

    async fn write_image(&self, path: &Path, frame: &Frame) -> Result<(), MediaError> {
        still::write_image(path, frame).await
    }

    async fn validate(&self) -> Result<(), MediaError> {
        Command::new(&self.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        Command::new(&self.ffprobe_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::FfprobeNotFound {
                        path: self.ffprobe_path.clone(),
                    }
                } else {
                    MediaError::Io(e)
                }
            })?;

        Ok(())
    }
}

/// Frames decoded by an ffmpeg child process.
struct FfmpegFrameSource {
    path: PathBuf,
    info: VideoInfo,
    child: Child,
    stdout: Option<ChildStdout>,
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, MediaError> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; self.info.frame_len()];
        match stdout.read_exact(&mut buf).await {
            Ok(_) => {}
            // A short read is the decoder hitting end of stream
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.stdout = None;
                return Ok(None);
            }
            Err(e) => {
                self.stdout = None;
                return Err(MediaError::decode(&self.path, e.to_string()));
            }
        }

        Frame::from_raw(self.info.width, self.info.height, buf)
            .map(Some)
            .ok_or_else(|| MediaError::decode(&self.path, "frame buffer size mismatch"))
    }

    async fn close(&mut self) -> Result<(), MediaError> {
        self.stdout = None;
        if self.child.try_wait()?.is_none() {
            // Stopped before end of stream; the rest of the output is unwanted
            let _ = self.child.kill().await;
        }
        Ok(())
    }
}

/// Raw encoder fed through an ffmpeg child's stdin.
struct FfmpegFrameSink {
    path: PathBuf,
    width: u32,
    height: u32,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_task: Option<JoinHandle<String>>,
    finished: bool,
}

#[async_trait]
impl FrameSink for FfmpegFrameSink {
    async fn write_frame(&mut self, frame: &Frame) -> Result<(), MediaError> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(MediaError::encode(
                &self.path,
                format!(
                    "frame is {}x{}, encoder expects {}x{}",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            ));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MediaError::encode(&self.path, "encoder already finished"))?;

        stdin
            .write_all(frame.as_raw())
            .await
            .map_err(|e| MediaError::encode(&self.path, e.to_string()))
    }

    async fn finish(&mut self) -> Result<(), MediaError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        // Closing stdin signals end of input
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.shutdown().await {
                warn!("Failed to close encoder input for {}: {}", self.path.display(), e);
            }
        }

        let status = self.child.wait().await?;
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(MediaError::encode(
                &self.path,
                format!("ffmpeg exited with code {:?}: {}", status.code(), stderr.trim()),
            ));
        }

        Ok(())
    }
}
