//! Application state for the claims REST API.
//!
//! This module provides the shared state that is passed to all API handlers.

use std::sync::Arc;

use crate::config::ImpactConfig;
use crate::inference::InferenceOrchestrator;
use crate::store::ClaimStore;

/// Shared application state for the API.
///
/// This is cloned for each request handler and provides thread-safe
/// access to shared resources.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (not cloned, shared via Arc).
struct AppStateInner {
    /// Event pipeline
    orchestrator: Arc<InferenceOrchestrator>,
    /// Configuration
    config: ApiConfig,
}

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: crate::config::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl From<&ImpactConfig> for ApiConfig {
    fn from(config: &ImpactConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

impl AppState {
    /// Create application state around an orchestrator.
    pub fn new(orchestrator: Arc<InferenceOrchestrator>, config: ApiConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                orchestrator,
                config,
            }),
        }
    }

    /// Event pipeline
    pub fn orchestrator(&self) -> &Arc<InferenceOrchestrator> {
        &self.inner.orchestrator
    }

    /// Claim store used by the pipeline
    pub fn store(&self) -> &Arc<dyn ClaimStore> {
        self.inner.orchestrator.store()
    }

    /// API configuration
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }
}
