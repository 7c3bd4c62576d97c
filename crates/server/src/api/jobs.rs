//! Upload, progress and result API handlers.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use vidmark_core::{media::output_file_name, JobSnapshot, JobStatus, SubmitError};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub job_id: String,
    /// Name the upload was saved under.
    pub subject_name: String,
    /// Name of the annotated result, for `/result` and `/download`.
    pub output_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultResponse {
    pub filename: String,
    /// Average inference time of the most recent completed job.
    pub average_inference_seconds: f64,
    pub download_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

// ============================================================================
// File names
// ============================================================================

/// Reduces a client-supplied file name to a safe base name.
///
/// Directory components are dropped and characters outside
/// `[A-Za-z0-9._-]` become `_`. Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Resolves a result file name from a URL, refusing anything that could
/// escape the result directory.
fn result_path(state: &AppState, filename: &str) -> Result<PathBuf, ApiError> {
    let invalid = filename.is_empty()
        || filename.contains(['/', '\\'])
        || filename == "."
        || filename == ".."
        || filename.contains('\0');
    if invalid {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid file name: {}", filename),
        ));
    }
    Ok(state.result_dir().join(filename))
}

fn content_type_for(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("bmp") => "image/bmp",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/upload
///
/// Saves the multipart `file` field under a fresh directory in the upload
/// dir and starts a job for it.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        filename = field.file_name().map(|s| s.to_string());
        match field.bytes().await {
            Ok(bytes) => file_data = Some(bytes.to_vec()),
            Err(e) => {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read file: {}", e),
                ))
            }
        }
    }

    let data = match file_data {
        Some(d) if !d.is_empty() => d,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, "No file provided")),
    };
    let subject_name = filename
        .as_deref()
        .and_then(sanitize_file_name)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No file name provided"))?;

    // Refuse before touching disk so a running job's input is never overwritten
    let orchestrator = state.orchestrator();
    if orchestrator.state().is_busy() {
        return Err(busy_error(orchestrator.snapshot()));
    }

    // Each upload gets its own directory so a concurrent upload of the same
    // name can never overwrite the input of a running job
    let upload_dir = state.upload_dir().join(Uuid::new_v4().to_string());
    let input_path = upload_dir.join(&subject_name);
    let output_name = output_file_name(&subject_name);
    let output_path = state.result_dir().join(&output_name);

    for dir in [upload_dir.as_path(), state.result_dir()] {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create {}: {}", dir.display(), e),
            )
        })?;
    }
    if let Err(e) = tokio::fs::write(&input_path, &data).await {
        discard_upload(&upload_dir).await;
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to save upload: {}", e),
        ));
    }

    let err = match orchestrator.submit(&input_path, &output_path) {
        Ok(handle) => {
            info!(
                "Accepted upload {} ({} bytes) as job {}",
                subject_name,
                data.len(),
                handle.job_id()
            );
            return Ok((
                StatusCode::ACCEPTED,
                Json(UploadResponse {
                    job_id: handle.job_id().to_string(),
                    subject_name,
                    output_name,
                }),
            ));
        }
        Err(e) => e,
    };

    discard_upload(&upload_dir).await;
    match err {
        SubmitError::Busy { .. } => {
            warn!("Upload {} rejected: {}", subject_name, err);
            Err(api_error(StatusCode::CONFLICT, err.to_string()))
        }
        SubmitError::InvalidInput(_) => Err(api_error(StatusCode::BAD_REQUEST, err.to_string())),
    }
}

async fn discard_upload(dir: &FsPath) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        warn!("Failed to remove rejected upload {}: {}", dir.display(), e);
    }
}

fn busy_error(snapshot: JobSnapshot) -> ApiError {
    let err = SubmitError::Busy {
        job_id: snapshot.job_id.unwrap_or_default(),
        subject_name: snapshot.subject_name.unwrap_or_default(),
    };
    api_error(StatusCode::CONFLICT, err.to_string())
}

/// GET /api/v1/progress
pub async fn progress(State(state): State<Arc<AppState>>) -> Json<JobSnapshot> {
    Json(state.orchestrator().snapshot())
}

/// GET /api/v1/result/{filename}
///
/// Describes a finished result. The average belongs to the most recent job
/// and is 0 when that job has not completed.
pub async fn result(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<ResultResponse>, ApiError> {
    let path = result_path(&state, &filename)?;
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Result not found: {}", filename),
        ));
    }

    let snapshot = state.orchestrator().snapshot();
    let average_inference_seconds = match snapshot.status {
        JobStatus::Completed => snapshot.average_inference_seconds.unwrap_or(0.0),
        _ => 0.0,
    };

    Ok(Json(ResultResponse {
        download_url: format!("/api/v1/download/{}", filename),
        filename,
        average_inference_seconds,
    }))
}

/// GET /api/v1/download/{filename}
///
/// Sends a result file as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = result_path(&state, &filename)?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                format!("Result not found: {}", filename),
            ))
        }
        Err(e) => {
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read {}: {}", filename, e),
            ))
        }
    };

    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', "_"));
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&path).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
