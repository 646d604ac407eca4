//! Data Transfer Objects (DTOs) for the claims REST API.
//!
//! Upload responses reuse [`ClaimOutcome`](crate::inference::ClaimOutcome)
//! and claim lookups return [`ClassificationResult`](crate::ClassificationResult)
//! unchanged; the types here cover the remaining envelopes.

use serde::{Deserialize, Serialize};

pub use crate::inference::ClaimOutcome as UploadResponse;

/// Multipart field carrying the event archive
pub const UPLOAD_FIELD: &str = "file";

/// Required upload file extension
pub const UPLOAD_EXTENSION: &str = ".zip";

/// Response body for `GET /claims`.
///
/// ## Example Response
///
/// ```json
/// { "claims": ["0b6f…", "5c21…"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimListResponse {
    /// Claim ids in lexicographic order
    pub claims: Vec<String>,
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}
