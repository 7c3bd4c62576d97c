//! Configuration for the pipeline module.

use serde::{Deserialize, Serialize};

/// Configuration for the frame pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Frame rate of the raw intermediate video.
    ///
    /// Applied regardless of the source's own rate, so a 30 fps upload plays
    /// back slower after annotation.
    #[serde(default = "default_output_fps")]
    pub output_fps: f64,
}

fn default_output_fps() -> f64 {
    20.0
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_fps: default_output_fps(),
        }
    }
}

impl PipelineConfig {
    /// Set the intermediate frame rate.
    pub fn with_output_fps(mut self, fps: f64) -> Self {
        self.output_fps = fps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_fps() {
        assert_eq!(PipelineConfig::default().output_fps, 20.0);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(config.output_fps, 20.0);

        let config: PipelineConfig = toml::from_str("output_fps = 25.0").unwrap();
        assert_eq!(config.output_fps, 25.0);
    }
}
