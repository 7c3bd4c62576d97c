use super::{
    types::{AnnotatorBackend, Config},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Annotator section exists (enforced by serde)
/// - Server port is not 0
/// - Upload limit is not 0
/// - HTTP annotator has a non-empty URL
/// - Output frame rate is positive
/// - Transcoder CRF is within the x264/x265 range
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.max_upload_mb == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_upload_mb cannot be 0".to_string(),
        ));
    }

    if config.annotator.backend == AnnotatorBackend::Http {
        match &config.annotator.http {
            Some(http) if !http.url.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "annotator.http.url is required when annotator.backend = \"http\"".to_string(),
                ))
            }
        }
    }

    if !(config.pipeline.output_fps > 0.0) {
        return Err(ConfigError::ValidationError(
            "pipeline.output_fps must be positive".to_string(),
        ));
    }

    if config.transcoder.crf > 51 {
        return Err(ConfigError::ValidationError(format!(
            "transcoder.crf must be between 0 and 51, got {}",
            config.transcoder.crf
        )));
    }

    Ok(())
}
