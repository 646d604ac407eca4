//! # IMPACT Claims
//!
//! Crash-event ingestion, two-stage classification, emergency escalation and
//! claim persistence.
//!
//! An uploaded event archive is extracted into a private workspace, its
//! event directory is located, features are computed by `impact-signal`,
//! and two frozen decision forests decide whether a crash occurred and how
//! severe it was. Heavy crashes produce an escalation record. Every
//! successfully processed event becomes an immutable claim.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      impact-claims                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌───────────────┐   ┌────────────────┐   │
//! │  │  Ingest  │──▶│   Inference   │──▶│     Store      │   │
//! │  │ archive  │   │ orchestrator  │   │ file / memory  │   │
//! │  └──────────┘   └───┬───────┬───┘   └────────────────┘   │
//! │                     │       │                            │
//! │              ┌──────▼──┐ ┌──▼───────┐                    │
//! │              │   ML    │ │ Alerting │                    │
//! │              │ gateway │ │ policy   │                    │
//! │              └─────────┘ └──────────┘                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use impact_claims::{
//!     ClassifierGateway, FileClaimStore, ImpactConfig, InferenceOrchestrator,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ImpactConfig::load()?;
//!     let gateway = Arc::new(ClassifierGateway::from_models_dir(&config.models_dir));
//!     let store = Arc::new(FileClaimStore::new(config.results_dir()));
//!     let orchestrator = InferenceOrchestrator::new(&config, gateway, store);
//!
//!     let bytes = std::fs::read("event.zip")?;
//!     let outcome = orchestrator.process_archive(&bytes)?;
//!     println!("claim {} crash={}", outcome.claim_id, outcome.result.crash());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

use std::path::PathBuf;

pub mod alerting;
pub mod api;
pub mod config;
pub mod domain;
pub mod inference;
pub mod ingest;
pub mod ml;
pub mod store;

// Re-export main types
pub use alerting::EscalationPolicy;
pub use api::{create_router, AppState};
pub use config::{ImpactConfig, ImpactConfigBuilder};
pub use domain::{
    claim::{Claim, ClaimId},
    classification::{Classification, ClassificationResult, Severity},
    escalation::EscalationRecord,
};
pub use inference::{ClaimOutcome, InferenceOrchestrator, Stage};
pub use ingest::{
    ArchiveExtractor, ArchiveLimits, EventLayout, EventLocator, EventRoot, RequestWorkspace,
};
pub use ml::{
    ClassifierGateway, ConfirmedCrash, CrashVerdict, DecisionForest, DecisionFunction, MlError,
    MlResult, ModelPaths,
};
pub use store::{ClaimReservation, ClaimStore, FileClaimStore, InMemoryClaimStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for claim operations
pub type Result<T> = std::result::Result<T, ImpactError>;

/// Unified error type for claim operations
#[derive(Debug, thiserror::Error)]
pub enum ImpactError {
    /// Archive entry would land outside the extraction root, is a link,
    /// or the archive exceeds configured limits
    #[error("Unsafe archive content: {0}")]
    UnsafeArchiveContent(String),

    /// Upload is not a readable zip archive
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    /// No unique event directory could be resolved
    #[error("Event layout ambiguous: {0}")]
    EventLayoutAmbiguous(String),

    /// Sensor table is missing columns or holds unusable values
    #[error("Malformed event data: {0}")]
    MalformedEventData(String),

    /// Recording too short to classify
    #[error("Insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples {
        /// Minimum number of samples required
        required: usize,
        /// Number of samples provided
        actual: usize,
    },

    /// Classifier artifact missing
    #[error("Model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Classifier artifact unreadable or inconsistent
    #[error("Model corrupt: {}: {reason}", .path.display())]
    ModelCorrupt {
        /// Artifact path
        path: PathBuf,
        /// What failed
        reason: String,
    },

    /// Claim could not be durably written
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// Claim id unknown to the store
    #[error("Claim not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImpactError {
    /// True for failures caused by the uploaded content rather than the
    /// service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImpactError::UnsafeArchiveContent(_)
                | ImpactError::InvalidArchive(_)
                | ImpactError::EventLayoutAmbiguous(_)
                | ImpactError::MalformedEventData(_)
                | ImpactError::InsufficientSamples { .. }
                | ImpactError::NotFound(_)
        )
    }
}

impl From<impact_signal::SignalError> for ImpactError {
    fn from(err: impact_signal::SignalError) -> Self {
        use impact_signal::SignalError;
        match err {
            SignalError::InsufficientSamples { required, actual } => {
                ImpactError::InsufficientSamples { required, actual }
            }
            SignalError::MalformedEventData(msg) => ImpactError::MalformedEventData(msg),
            SignalError::Csv(e) => ImpactError::MalformedEventData(e.to_string()),
            SignalError::Metadata(e) => {
                ImpactError::MalformedEventData(format!("metadata: {}", e))
            }
            SignalError::Io(e) => ImpactError::Io(e),
        }
    }
}

impl From<MlError> for ImpactError {
    fn from(err: MlError) -> Self {
        match err {
            MlError::ModelNotFound(path) => ImpactError::ModelNotFound(path),
            MlError::ModelCorrupt { path, reason } => ImpactError::ModelCorrupt { path, reason },
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ClaimId, ClaimStore, Classification, ClassificationResult, ClassifierGateway,
        EscalationRecord, ImpactConfig, ImpactError, InferenceOrchestrator, Result, Severity,
    };
    pub use impact_signal::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_signal_error_conversion() {
        let err: ImpactError = impact_signal::SignalError::InsufficientSamples {
            required: 10,
            actual: 2,
        }
        .into();
        assert!(matches!(
            err,
            ImpactError::InsufficientSamples { required: 10, actual: 2 }
        ));

        let err: ImpactError = impact_signal::SignalError::malformed("bad").into();
        assert!(matches!(err, ImpactError::MalformedEventData(ref m) if m == "bad"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_ml_error_conversion() {
        let err: ImpactError = MlError::ModelNotFound(PathBuf::from("models/x.json")).into();
        assert!(matches!(err, ImpactError::ModelNotFound(_)));
        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "Model not found: models/x.json");
    }
}
