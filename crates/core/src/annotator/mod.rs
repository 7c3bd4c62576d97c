//! Object-detection annotators.
//!
//! The model itself lives outside this crate. An `Annotator` takes a frame,
//! runs detection and returns a copy with the detections drawn on it.
//! `annotate_timed` wraps a call with latency measurement and produces the
//! `FrameRecord` the pipelines consume.

mod error;
mod http;
mod passthrough;
mod traits;

pub use error::AnnotatorError;
pub use http::HttpAnnotator;
pub use passthrough::PassthroughAnnotator;
pub use traits::{annotate_timed, Annotator, FrameRecord};

use crate::config::{AnnotatorBackend, AnnotatorConfig};

/// Create an annotator based on configuration
pub fn create_annotator(config: &AnnotatorConfig) -> Result<Box<dyn Annotator>, AnnotatorError> {
    match config.backend {
        AnnotatorBackend::Passthrough => Ok(Box::new(PassthroughAnnotator)),
        AnnotatorBackend::Http => {
            let http = config.http.clone().ok_or_else(|| {
                AnnotatorError::ConnectionFailed("no [annotator.http] section configured".to_string())
            })?;
            Ok(Box::new(HttpAnnotator::new(http)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpAnnotatorConfig;

    #[test]
    fn test_create_passthrough_annotator() {
        let config = AnnotatorConfig {
            backend: AnnotatorBackend::Passthrough,
            http: None,
        };
        let annotator = create_annotator(&config).unwrap();
        assert_eq!(annotator.name(), "passthrough");
    }

    #[test]
    fn test_create_http_annotator() {
        let config = AnnotatorConfig {
            backend: AnnotatorBackend::Http,
            http: Some(HttpAnnotatorConfig {
                url: "http://localhost:9000/annotate".to_string(),
                api_key: None,
                timeout_secs: 10,
            }),
        };
        let annotator = create_annotator(&config).unwrap();
        assert_eq!(annotator.name(), "http");
    }

    #[test]
    fn test_create_http_annotator_without_section_fails() {
        let config = AnnotatorConfig {
            backend: AnnotatorBackend::Http,
            http: None,
        };
        assert!(create_annotator(&config).is_err());
    }
}
