//! Axum request handlers for the claims REST API.
//!
//! Each handler is documented with OpenAPI-style documentation comments.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};

use super::dto::*;
use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::domain::classification::ClassificationResult;

// ============================================================================
// Upload Handlers
// ============================================================================

/// Upload an event archive and classify it.
///
/// # OpenAPI Specification
///
/// ```yaml
/// /upload_event:
///   post:
///     summary: Upload an event archive
///     description: |
///       Accepts a zip archive holding one event directory (imu.csv plus
///       optional meta.json), classifies it and stores the result as a claim.
///     tags: [Claims]
///     requestBody:
///       required: true
///       content:
///         multipart/form-data:
///           schema:
///             type: object
///             properties:
///               file:
///                 type: string
///                 format: binary
///     responses:
///       200:
///         description: Claim created
///       400:
///         description: Missing file, not a zip, or unsafe archive
///       413:
///         description: Upload exceeds the configured limit
///       422:
///         description: Event layout or sensor data unusable
///       503:
///         description: Classifier models unavailable
/// ```
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_event(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let limit = state.config().max_upload_bytes;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_owned);
        if !filename.as_deref().is_some_and(is_zip_filename) {
            return Err(ApiError::bad_request(
                format!("Upload must be a {} file", UPLOAD_EXTENSION),
                Some(UPLOAD_FIELD),
            ));
        }

        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        upload = Some(bytes);
        break;
    }

    let bytes = upload.ok_or_else(|| {
        ApiError::bad_request(
            format!("Missing multipart field '{}'", UPLOAD_FIELD),
            Some(UPLOAD_FIELD),
        )
    })?;

    if bytes.len() > limit {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    tracing::info!(bytes = bytes.len(), "Received event upload");

    let orchestrator = state.orchestrator().clone();
    let outcome = tokio::task::spawn_blocking(move || orchestrator.process_archive(&bytes))
        .await
        .map_err(|e| ApiError::task_failed("Event processing task failed", e))??;

    Ok(Json(outcome))
}

// ============================================================================
// Claim Handlers
// ============================================================================

/// List all claim ids.
///
/// # OpenAPI Specification
///
/// ```yaml
/// /claims:
///   get:
///     summary: List claims
///     tags: [Claims]
///     responses:
///       200:
///         description: Claim ids in lexicographic order
/// ```
#[tracing::instrument(skip(state))]
pub async fn list_claims(State(state): State<AppState>) -> ApiResult<Json<ClaimListResponse>> {
    let store = state.store().clone();
    let ids = tokio::task::spawn_blocking(move || store.list())
        .await
        .map_err(|e| ApiError::task_failed("Claim listing task failed", e))??;

    Ok(Json(ClaimListResponse {
        claims: ids.iter().map(ToString::to_string).collect(),
    }))
}

/// Get a stored claim result.
///
/// # OpenAPI Specification
///
/// ```yaml
/// /claims/{claim_id}:
///   get:
///     summary: Get claim
///     tags: [Claims]
///     parameters:
///       - name: claim_id
///         in: path
///         required: true
///         schema:
///           type: string
///     responses:
///       200:
///         description: Stored classification result
///       404:
///         description: Unknown or malformed claim id
/// ```
#[tracing::instrument(skip(state))]
pub async fn get_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
) -> ApiResult<Json<ClassificationResult>> {
    let store = state.store().clone();
    let result = tokio::task::spawn_blocking(move || store.get(&claim_id))
        .await
        .map_err(|e| ApiError::task_failed("Claim lookup task failed", e))??;

    Ok(Json(result))
}

// ============================================================================
// Health
// ============================================================================

/// Liveness check.
///
/// ```yaml
/// /health:
///   get:
///     responses:
///       200:
///         description: '{"ok": true}'
/// ```
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

// ============================================================================
// Helpers
// ============================================================================

fn is_zip_filename(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(UPLOAD_EXTENSION)
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::bad_request(err.body_text(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_filename_check() {
        assert!(is_zip_filename("event.zip"));
        assert!(is_zip_filename("EVENT.ZIP"));
        assert!(!is_zip_filename("event.tar.gz"));
        assert!(!is_zip_filename("zip"));
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert!(body.ok);
    }
}
