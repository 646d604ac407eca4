//! Machine learning module for crash detection and severity grading.
//!
//! This module provides:
//! - A portable decision-forest artifact format and evaluator
//! - The [`DecisionFunction`] seam the gateway classifies through
//! - A load-once [`ClassifierGateway`] over the two frozen models
//!
//! ## Architecture
//!
//! ```text
//! CrashFeatures ──▶ crash model ──▶ CrashVerdict
//!                                      │ Crash(ConfirmedCrash)
//!                                      ▼
//! SeverityFeatures ─────────────▶ severity model ──▶ Severity
//! ```

mod forest;
mod gateway;

pub use forest::{DecisionForest, DecisionTree, TreeNode};
pub use gateway::{
    ClassifierGateway, ConfirmedCrash, CrashVerdict, LoadedModels, ModelPaths,
    CRASH_MODEL_FILE, SEVERITY_MODEL_FILE,
};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in ML operations
#[derive(Debug, Error)]
pub enum MlError {
    /// Model artifact does not exist
    #[error("Model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Model artifact exists but cannot be used
    #[error("Model corrupt: {}: {reason}", .path.display())]
    ModelCorrupt {
        /// Artifact path
        path: PathBuf,
        /// What failed
        reason: String,
    },
}

impl MlError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MlError::ModelCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for ML operations
pub type MlResult<T> = Result<T, MlError>;

/// A frozen classifier: fixed input arity, integer class label output.
///
/// Implementations are immutable after construction and shared across
/// threads.
pub trait DecisionFunction: Send + Sync + std::fmt::Debug {
    /// Number of input features expected
    fn n_features(&self) -> usize;

    /// Predict a class label for one feature vector of length
    /// [`n_features`](Self::n_features).
    fn predict(&self, features: &[f64]) -> i64;
}
