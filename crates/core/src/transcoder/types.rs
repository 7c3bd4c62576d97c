//! Types for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of a successful transcode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeOutcome {
    /// Path to the final file.
    pub output_path: PathBuf,
    /// Final file size in bytes.
    pub output_size_bytes: u64,
    /// Wall-clock time spent in the encoder, in milliseconds.
    pub duration_ms: u64,
}
