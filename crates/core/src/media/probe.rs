//! Video stream metadata from ffprobe.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::MediaError;

/// What the frame pipeline needs to know about a video before decoding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame count from container metadata. Missing or zero for some
    /// encodings; progress is indeterminate in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u64>,
    /// Source frame rate (informational only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl VideoInfo {
    /// Size in bytes of one packed RGB24 frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Frame count usable as a progress denominator.
    pub fn progress_total(&self) -> Option<u64> {
        self.frame_count.filter(|n| *n > 0)
    }
}

/// Parses `ffprobe -print_format json -show_format -show_streams` output.
pub(crate) fn parse_probe_output(path: &Path, output: &str) -> Result<VideoInfo, MediaError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        #[serde(default)]
        format: Option<ProbeFormat>,
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        codec_type: String,
        width: Option<u32>,
        height: Option<u32>,
        nb_frames: Option<String>,
        r_frame_rate: Option<String>,
        duration: Option<String>,
    }

    let probe: ProbeOutput = serde_json::from_str(output)
        .map_err(|e| MediaError::probe_failed(format!("Failed to parse ffprobe output: {}", e)))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::NoVideoStream {
            path: path.to_path_buf(),
        })?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(MediaError::probe_failed(format!(
                "video stream in {} has no dimensions",
                path.display()
            )))
        }
    };

    let duration_secs = stream
        .duration
        .as_ref()
        .or(probe.format.as_ref().and_then(|f| f.duration.as_ref()))
        .and_then(|d| d.parse::<f64>().ok());

    Ok(VideoInfo {
        width,
        height,
        frame_count: stream
            .nb_frames
            .as_ref()
            .and_then(|n| n.parse::<u64>().ok()),
        fps: stream.r_frame_rate.as_deref().and_then(parse_frame_rate),
        duration_secs,
    })
}

/// Parses frame rates like "24000/1001" or "30".
fn parse_frame_rate(rate: &str) -> Option<f32> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f32>().ok()?;
            let den = den.parse::<f32>().ok()?;
            if den > 0.0 {
                Some(num / den)
            } else {
                None
            }
        }
        None => rate.parse::<f32>().ok(),
    }
}
