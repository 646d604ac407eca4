//! API error types and handling for the claims REST API.
//!
//! This module provides a unified error type that maps to appropriate HTTP status codes
//! and JSON error responses for the API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ImpactError;

/// API error type that converts to HTTP responses.
///
/// All errors include:
/// - An HTTP status code
/// - A machine-readable error code
/// - A human-readable message
/// - Optional additional details
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request data (400)
    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        field: Option<String>,
    },

    /// Upload larger than the configured limit (413)
    #[error("Payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Internal server error (500)
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Domain error from the claim pipeline
    #[error(transparent)]
    Domain(#[from] ImpactError),
}

impl ApiError {
    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::BadRequest {
            message: message.into(),
            field: field.map(String::from),
        }
    }

    /// Wrap a failed blocking task as an internal error.
    pub fn task_failed(message: impl Into<String>, err: tokio::task::JoinError) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Domain(e) => match e {
                ImpactError::UnsafeArchiveContent(_) | ImpactError::InvalidArchive(_) => {
                    StatusCode::BAD_REQUEST
                }
                ImpactError::EventLayoutAmbiguous(_)
                | ImpactError::MalformedEventData(_)
                | ImpactError::InsufficientSamples { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ImpactError::ModelNotFound(_) | ImpactError::ModelCorrupt { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                ImpactError::NotFound(_) => StatusCode::NOT_FOUND,
                ImpactError::PersistenceFailed(_)
                | ImpactError::Config(_)
                | ImpactError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Domain(e) => match e {
                ImpactError::UnsafeArchiveContent(_) => "UNSAFE_ARCHIVE_CONTENT",
                ImpactError::InvalidArchive(_) => "INVALID_ARCHIVE",
                ImpactError::EventLayoutAmbiguous(_) => "EVENT_LAYOUT_AMBIGUOUS",
                ImpactError::MalformedEventData(_) => "MALFORMED_EVENT_DATA",
                ImpactError::InsufficientSamples { .. } => "INSUFFICIENT_SAMPLES",
                ImpactError::ModelNotFound(_) => "MODEL_NOT_FOUND",
                ImpactError::ModelCorrupt { .. } => "MODEL_CORRUPT",
                ImpactError::PersistenceFailed(_) => "PERSISTENCE_FAILED",
                ImpactError::NotFound(_) => "NOT_FOUND",
                ImpactError::Config(_) => "CONFIG_ERROR",
                ImpactError::Io(_) => "IO_ERROR",
            },
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// Additional error details.
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    /// Resource type involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Resource ID involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Field that caused the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();
        let message = self.to_string();

        let details = match &self {
            ApiError::Domain(ImpactError::NotFound(id)) => Some(ErrorDetails {
                resource_type: Some("Claim".to_string()),
                resource_id: Some(id.clone()),
                field: None,
            }),
            ApiError::BadRequest { field, .. } => field.as_ref().map(|f| ErrorDetails {
                resource_type: None,
                resource_id: None,
                field: Some(f.clone()),
            }),
            _ => None,
        };

        // Log errors
        if status.is_server_error() {
            match &self {
                ApiError::Internal {
                    source: Some(src), ..
                } => tracing::error!(error = %self, source = %src, "API error"),
                _ => tracing::error!(error = %self, "API error"),
            }
        } else {
            tracing::warn!(error = %self, "API error");
        }

        let body = ErrorResponse {
            code,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (ImpactError::InvalidArchive("x".into()), StatusCode::BAD_REQUEST),
            (ImpactError::UnsafeArchiveContent("x".into()), StatusCode::BAD_REQUEST),
            (ImpactError::EventLayoutAmbiguous("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ImpactError::MalformedEventData("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                ImpactError::InsufficientSamples { required: 10, actual: 1 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ImpactError::ModelNotFound(PathBuf::from("m")), StatusCode::SERVICE_UNAVAILABLE),
            (
                ImpactError::ModelCorrupt { path: PathBuf::from("m"), reason: "x".into() },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ImpactError::PersistenceFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ImpactError::NotFound("x".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::from(ImpactError::NotFound("abc".into())).error_code(), "NOT_FOUND");
        assert_eq!(ApiError::bad_request("no file", Some("file")).error_code(), "BAD_REQUEST");
        assert_eq!(
            ApiError::from(ImpactError::InvalidArchive("x".into())).error_code(),
            "INVALID_ARCHIVE"
        );
    }

    #[tokio::test]
    async fn test_panicked_task_is_internal_error() {
        let join_err = tokio::spawn(async { panic!("boom") }).await.unwrap_err();
        let err = ApiError::task_failed("Claim lookup task failed", join_err);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert!(std::error::Error::source(&err).is_some());
    }
}
