//! Media kind classification.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions routed to the video pipeline. Anything else is a still image.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// Container extension of every annotated video result.
pub const VIDEO_OUTPUT_EXTENSION: &str = "mp4";

/// Which pipeline a submitted file goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Classifies a path by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let is_video = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                VIDEO_EXTENSIONS
                    .iter()
                    .any(|v| v.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false);

        if is_video {
            Self::Video
        } else {
            Self::Image
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

/// Name of the result file produced for an uploaded file name.
///
/// Videos are always re-muxed into mp4; images keep their name so the
/// encoder picks the same format as the upload.
pub fn output_file_name(upload_name: &str) -> String {
    let path = Path::new(upload_name);
    match MediaKind::from_path(path) {
        MediaKind::Video => {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(upload_name);
            format!("{}.{}", stem, VIDEO_OUTPUT_EXTENSION)
        }
        MediaKind::Image => upload_name.to_string(),
    }
}
