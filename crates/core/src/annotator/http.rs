//! Annotator backed by a remote detection service.
//!
//! The service receives the frame as a PNG request body and answers with the
//! annotated frame as an image body (any format the `image` crate decodes).

use async_trait::async_trait;
use image::ImageFormat;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

use crate::config::HttpAnnotatorConfig;
use crate::media::Frame;

use super::error::AnnotatorError;
use super::traits::Annotator;

/// Maximum number of response body bytes echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

/// HTTP detection service client.
pub struct HttpAnnotator {
    client: Client,
    config: HttpAnnotatorConfig,
}

impl HttpAnnotator {
    /// Create a new HttpAnnotator with the given configuration.
    pub fn new(config: HttpAnnotatorConfig) -> Result<Self, AnnotatorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| AnnotatorError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn encode_png(frame: &Frame) -> Result<Vec<u8>, AnnotatorError> {
        let mut buf = Cursor::new(Vec::new());
        frame
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| AnnotatorError::Encode(e.to_string()))?;
        Ok(buf.into_inner())
    }

    fn decode_response(bytes: &[u8]) -> Result<Frame, AnnotatorError> {
        image::load_from_memory(bytes)
            .map(|img| img.to_rgb8())
            .map_err(|e| AnnotatorError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Annotator for HttpAnnotator {
    fn name(&self) -> &str {
        "http"
    }

    async fn annotate(&self, frame: Frame) -> Result<Frame, AnnotatorError> {
        let (width, height) = frame.dimensions();
        let body = tokio::task::spawn_blocking(move || Self::encode_png(&frame))
            .await
            .map_err(|e| AnnotatorError::Encode(e.to_string()))??;

        let mut request = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, "image/png")
            .header(ACCEPT, "image/*")
            .body(body);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AnnotatorError::Timeout
            } else {
                AnnotatorError::ConnectionFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnnotatorError::HttpStatus {
                status: status.as_u16(),
                body: truncate_on_char_boundary(body, MAX_ERROR_BODY),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                AnnotatorError::Timeout
            } else {
                AnnotatorError::InvalidResponse(e.to_string())
            }
        })?;

        let annotated = tokio::task::spawn_blocking(move || Self::decode_response(&bytes))
            .await
            .map_err(|e| AnnotatorError::InvalidResponse(e.to_string()))??;

        debug!(
            "Annotated {}x{} frame, response {}x{}",
            width,
            height,
            annotated.width(),
            annotated.height()
        );

        Ok(annotated)
    }
}

/// Cuts `text` to at most `max` bytes without splitting a character.
fn truncate_on_char_boundary(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves a single HTTP request with the given status and body.
    async fn serve_once(status_line: &'static str, content_type: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // Read headers, then exactly Content-Length bytes of body
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            let header_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                request.extend_from_slice(&chunk[..n]);
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while request.len() < header_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                content_type,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/annotate", addr)
    }

    fn annotator_for(url: String) -> HttpAnnotator {
        HttpAnnotator::new(HttpAnnotatorConfig {
            url,
            api_key: Some("token".to_string()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_annotate_decodes_png_response() {
        let annotated = Frame::from_pixel(4, 4, Rgb([255, 0, 0]));
        let body = HttpAnnotator::encode_png(&annotated).unwrap();
        let url = serve_once("200 OK", "image/png", body).await;

        let result = annotator_for(url)
            .annotate(Frame::new(4, 4))
            .await
            .unwrap();

        assert_eq!(result.dimensions(), (4, 4));
        assert_eq!(result.get_pixel(1, 1), &Rgb([255, 0, 0]));
    }

    #[tokio::test]
    async fn test_annotate_maps_error_status() {
        let url = serve_once(
            "503 Service Unavailable",
            "text/plain",
            b"model warming up".to_vec(),
        )
        .await;

        let err = annotator_for(url).annotate(Frame::new(2, 2)).await.unwrap_err();
        match err {
            AnnotatorError::HttpStatus { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model warming up");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_annotate_error_body_cut_between_characters() {
        // 511 ASCII bytes put the limit inside the first 3-byte euro sign
        let mut message = "a".repeat(MAX_ERROR_BODY - 1);
        message.push_str("€€€€");
        let url = serve_once(
            "500 Internal Server Error",
            "text/plain; charset=utf-8",
            message.into_bytes(),
        )
        .await;

        let err = annotator_for(url).annotate(Frame::new(2, 2)).await.unwrap_err();
        match err {
            AnnotatorError::HttpStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "a".repeat(MAX_ERROR_BODY - 1));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate_on_char_boundary("short".to_string(), 512), "short");
        assert_eq!(truncate_on_char_boundary("ab€".to_string(), 3), "ab");
        assert_eq!(truncate_on_char_boundary("ab€".to_string(), 5), "ab€");
        assert_eq!(truncate_on_char_boundary("€€".to_string(), 4), "€");
    }

    #[tokio::test]
    async fn test_annotate_rejects_non_image_response() {
        let url = serve_once("200 OK", "application/json", b"{\"boxes\":[]}".to_vec()).await;

        let err = annotator_for(url).annotate(Frame::new(2, 2)).await.unwrap_err();
        assert!(matches!(err, AnnotatorError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_annotate_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = annotator_for(format!("http://127.0.0.1:{}/annotate", port))
            .annotate(Frame::new(2, 2))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
