use std::path::Path;

use vidmark_core::{Config, JobOrchestrator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: JobOrchestrator,
}

impl AppState {
    pub fn new(config: Config, orchestrator: JobOrchestrator) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        &self.orchestrator
    }

    /// Directory uploaded files are saved to.
    pub fn upload_dir(&self) -> &Path {
        &self.config.storage.upload_dir
    }

    /// Directory annotated outputs are written to.
    pub fn result_dir(&self) -> &Path {
        &self.config.storage.result_dir
    }
}
