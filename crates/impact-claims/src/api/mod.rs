//! REST API endpoints for the IMPACT claim service.
//!
//! ## Endpoints
//!
//! - `POST /upload_event` - Upload an event archive (multipart field `file`)
//! - `GET /claims` - List claim ids
//! - `GET /claims/{claim_id}` - Fetch a claim result
//! - `GET /health` - Liveness check

pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use dto::*;
pub use error::ApiError;
pub use state::{ApiConfig, AppState};

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the claims API router with all endpoints.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use impact_claims::api::{create_router, ApiConfig, AppState};
/// use impact_claims::{ClassifierGateway, FileClaimStore, ImpactConfig, InferenceOrchestrator};
///
/// #[tokio::main]
/// async fn main() {
///     let config = ImpactConfig::default();
///     let gateway = Arc::new(ClassifierGateway::from_models_dir(&config.models_dir));
///     let store = Arc::new(FileClaimStore::new(config.results_dir()));
///     let orchestrator = Arc::new(InferenceOrchestrator::new(&config, gateway, store));
///     let app = create_router(AppState::new(orchestrator, ApiConfig::from(&config)));
///     // ... serve with axum
/// }
/// ```
pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .config()
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/upload_event", post(handlers::upload_event))
        .route("/claims", get(handlers::list_claims))
        .route("/claims/:claim_id", get(handlers::get_claim))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
