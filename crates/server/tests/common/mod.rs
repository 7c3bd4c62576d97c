//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock media, annotator and transcoder injected, so jobs run end to
//! end without ffmpeg or a detection model.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vidmark_core::{
    load_config_from_str,
    testing::{MockAnnotator, MockMediaBackend, MockTranscoder},
    Annotator, JobOrchestrator, MediaBackend, Transcoder,
};
use vidmark_server::state::AppState;

const MULTIPART_BOUNDARY: &str = "vidmark-test-boundary";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_upload() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.upload("clip.mp4", b"video bytes").await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock media backend - script frame counts and decode failures
    pub media: MockMediaBackend,
    /// Mock annotator - inject latency and failures
    pub annotator: MockAnnotator,
    /// Mock transcoder - inspect final encodes
    pub transcoder: MockTranscoder,
    pub state: Arc<AppState>,
    /// Temporary directory holding uploads, results and intermediates
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response with the raw body kept, for file downloads.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_upload_limit_mb(16).await
    }

    /// Create a test fixture with a custom upload size limit.
    pub async fn with_upload_limit_mb(max_upload_mb: u64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = load_config_from_str(
            r#"
[annotator]
backend = "passthrough"

[server]
host = "127.0.0.1"
port = 0
"#,
        )
        .expect("Failed to parse test config");
        config.server.max_upload_mb = max_upload_mb;
        config.storage.upload_dir = temp_dir.path().join("uploads");
        config.storage.result_dir = temp_dir.path().join("results");
        config.storage.temp_dir = temp_dir.path().join("tmp");

        // Create mocks
        let media = MockMediaBackend::new();
        media.set_touch_files(true).await;
        let annotator = MockAnnotator::new();
        let transcoder = MockTranscoder::new();

        let orchestrator = JobOrchestrator::new(
            Arc::new(media.clone()) as Arc<dyn MediaBackend>,
            Arc::new(annotator.clone()) as Arc<dyn Annotator>,
            Arc::new(transcoder.clone()) as Arc<dyn Transcoder>,
        )
        .with_temp_dir(config.storage.temp_dir.clone())
        .with_pipeline_config(config.pipeline.clone());

        let state = Arc::new(AppState::new(config, orchestrator));
        let router = vidmark_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            media,
            annotator,
            transcoder,
            state,
            temp_dir,
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.temp_dir.path().join("uploads")
    }

    /// Saved uploads as `(file name, contents)`, across all upload directories.
    pub fn saved_uploads(&self) -> Vec<(String, Vec<u8>)> {
        let mut uploads = Vec::new();
        let Ok(entries) = std::fs::read_dir(self.upload_dir()) else {
            return uploads;
        };
        for entry in entries.flatten() {
            let Ok(files) = std::fs::read_dir(entry.path()) else {
                continue;
            };
            for file in files.flatten() {
                let name = file.file_name().to_string_lossy().into_owned();
                let contents = std::fs::read(file.path()).unwrap_or_default();
                uploads.push((name, contents));
            }
        }
        uploads.sort();
        uploads
    }

    pub fn result_dir(&self) -> PathBuf {
        self.temp_dir.path().join("results")
    }

    pub fn intermediate_dir(&self) -> PathBuf {
        self.temp_dir.path().join("tmp")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let raw = self.send(request).await;
        to_json(raw)
    }

    /// Send a GET request and keep the raw body and headers.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Upload a file through the multipart endpoint.
    pub async fn upload(&self, filename: &str, contents: &[u8]) -> TestResponse {
        self.upload_field("file", Some(filename), contents).await
    }

    /// Upload arbitrary multipart content under a given field name.
    pub async fn upload_field(
        &self,
        field: &str,
        filename: Option<&str>,
        contents: &[u8],
    ) -> TestResponse {
        let body = multipart_body(field, filename, contents);
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/upload")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        let raw = self.send(request).await;
        to_json(raw)
    }

    /// Poll `/progress` until the job leaves `processing`.
    pub async fn wait_for_terminal(&self) -> Value {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let response = self.get("/api/v1/progress").await;
            let status = response.body["status"].as_str().unwrap_or_default().to_string();
            if status == "completed" || status == "failed" {
                return response.body;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "Job did not finish in time, last progress: {}",
                response.body
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        RawResponse {
            status,
            headers,
            bytes,
        }
    }
}

fn to_json(raw: RawResponse) -> TestResponse {
    let body: Value = if raw.bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&raw.bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status: raw.status,
        body,
    }
}

fn multipart_body(field: &str, filename: Option<&str>, contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, name
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
