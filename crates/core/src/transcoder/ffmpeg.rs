//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::TranscoderConfig;
use super::error::TranscoderError;
use super::traits::Transcoder;
use super::types::TranscodeOutcome;

/// Maximum number of stderr lines kept for error reports.
const MAX_STDERR_LINES: usize = 20;

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    /// Builds ffmpeg arguments for the final encode.
    fn build_args(&self, raw_path: &Path, final_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            raw_path.to_string_lossy().to_string(),
        ];

        // Video codec and quality
        args.extend([
            "-c:v".to_string(),
            self.config.video_codec.clone(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
        ]);

        // Audio is passed through untouched
        args.extend(["-c:a".to_string(), "copy".to_string()]);

        // Log level
        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);

        // Extra args
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        // Output
        args.push(final_path.to_string_lossy().to_string());

        args
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(
        &self,
        raw_path: &Path,
        final_path: &Path,
    ) -> Result<TranscodeOutcome, TranscoderError> {
        let start = Instant::now();

        if !raw_path.exists() {
            return Err(TranscoderError::InputNotFound {
                path: raw_path.to_path_buf(),
            });
        }

        // Ensure output directory exists
        if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                TranscoderError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        let args = self.build_args(raw_path, final_path);
        debug!("Running {} {}", self.config.ffmpeg_path.display(), args.join(" "));

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscoderError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscoderError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TranscoderError::failed("stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut tail: Vec<String> = Vec::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if tail.len() == MAX_STDERR_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, Vec<String>), std::io::Error>((status, tail))
        })
        .await;

        match result {
            Ok(Ok((status, tail))) => {
                if !status.success() {
                    return Err(TranscoderError::failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if tail.is_empty() {
                            None
                        } else {
                            Some(tail.join("\n"))
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(TranscoderError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                return Err(TranscoderError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        // Verify output exists and get size
        let output_meta = tokio::fs::metadata(final_path)
            .await
            .map_err(|_| TranscoderError::failed("Output file not created", None))?;

        Ok(TranscodeOutcome {
            output_path: final_path.to_path_buf(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        // Check ffmpeg exists
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscoderError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(TranscoderError::Io(e));
        }

        // Check ffprobe exists
        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscoderError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(TranscoderError::Io(e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_args_default_policy() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_args(Path::new("/tmp/raw.mp4"), Path::new("/out/final.mp4"));

        assert_eq!(&args[..3], &["-y", "-i", "/tmp/raw.mp4"]);
        let pairs: Vec<(&str, &str)> = args
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str()))
            .collect();
        assert!(pairs.contains(&("-c:v", "libx264")));
        assert!(pairs.contains(&("-preset", "slow")));
        assert!(pairs.contains(&("-crf", "22")));
        assert!(pairs.contains(&("-c:a", "copy")));
        assert_eq!(args.last().map(String::as_str), Some("/out/final.mp4"));
    }

    #[test]
    fn test_build_args_extra_args_before_output() {
        let mut config = TranscoderConfig::default().with_crf(30);
        config.extra_ffmpeg_args = vec!["-movflags".to_string(), "+faststart".to_string()];
        let transcoder = FfmpegTranscoder::new(config);
        let args = transcoder.build_args(Path::new("raw.mp4"), Path::new("final.mp4"));

        assert!(args.contains(&"30".to_string()));
        let n = args.len();
        assert_eq!(args[n - 3], "-movflags");
        assert_eq!(args[n - 2], "+faststart");
        assert_eq!(args[n - 1], "final.mp4");
    }

    #[tokio::test]
    async fn test_transcode_missing_input() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let err = transcoder
            .transcode(Path::new("/nonexistent/raw.mp4"), Path::new("/tmp/final.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscoderError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_transcode_missing_binary() {
        let dir = tempfile::TempDir::new().unwrap();
        let raw = dir.path().join("raw.mp4");
        std::fs::write(&raw, b"raw").unwrap();

        let transcoder = FfmpegTranscoder::new(TranscoderConfig::with_paths(
            PathBuf::from("/nonexistent/bin/ffmpeg"),
            PathBuf::from("/nonexistent/bin/ffprobe"),
        ));
        let err = transcoder
            .transcode(&raw, &dir.path().join("final.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscoderError::FfmpegNotFound { .. }));

        let err = transcoder.validate().await.unwrap_err();
        assert!(matches!(err, TranscoderError::FfmpegNotFound { .. }));
    }
}
