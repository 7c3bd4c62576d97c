//! Scoped ownership of a job's intermediate file.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Removes the file at `path` when dropped.
///
/// Jobs call [`TempArtifact::remove`] on their normal paths; the `Drop` impl
/// covers early returns and panics.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    removed: bool,
}

impl TempArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file now. A file that never got created is fine.
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!("Removed intermediate file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove intermediate file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed intermediate file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove intermediate file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
