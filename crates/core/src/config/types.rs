use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::pipeline::PipelineConfig;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub annotator: AnnotatorConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload, in megabytes.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_mb() -> u64 {
    512
}

/// Where uploads, results and intermediate files live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_result_dir")]
    pub result_dir: PathBuf,
    /// Raw intermediate encodings are written here before transcoding.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            result_dir: default_result_dir(),
            temp_dir: default_temp_dir(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_result_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("vidmark")
}

/// Annotator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnnotatorConfig {
    pub backend: AnnotatorBackend,
    /// HTTP detection service settings (required when backend = "http")
    #[serde(default)]
    pub http: Option<HttpAnnotatorConfig>,
}

/// Available annotator backends
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnnotatorBackend {
    /// Returns frames unchanged. Useful for smoke tests and pipeline benchmarks.
    Passthrough,
    /// Remote detection service that draws boxes on a posted PNG frame.
    Http,
}

/// Remote detection service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpAnnotatorConfig {
    /// Endpoint accepting a PNG body and answering with the annotated PNG
    /// (e.g., "http://localhost:9000/annotate")
    pub url: String,
    /// Optional bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_annotator_timeout")]
    pub timeout_secs: u32,
}

fn default_annotator_timeout() -> u32 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub annotator: SanitizedAnnotatorConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub transcoder: TranscoderConfig,
}

/// Sanitized annotator config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAnnotatorConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<SanitizedHttpAnnotatorConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedHttpAnnotatorConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            annotator: SanitizedAnnotatorConfig {
                backend: match config.annotator.backend {
                    AnnotatorBackend::Passthrough => "passthrough".to_string(),
                    AnnotatorBackend::Http => "http".to_string(),
                },
                http: config
                    .annotator
                    .http
                    .as_ref()
                    .map(|h| SanitizedHttpAnnotatorConfig {
                        url: h.url.clone(),
                        api_key_configured: h.api_key.as_ref().is_some_and(|k| !k.is_empty()),
                        timeout_secs: h.timeout_secs,
                    }),
            },
            server: config.server.clone(),
            storage: config.storage.clone(),
            pipeline: config.pipeline.clone(),
            transcoder: config.transcoder.clone(),
        }
    }
}
