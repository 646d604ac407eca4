//! Load-once gateway over the crash and severity classifiers.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use impact_signal::{CrashFeatures, SeverityFeatures, CRASH_FEATURE_COUNT, SEVERITY_FEATURE_COUNT};
use parking_lot::RwLock;
use tracing::{error, info, instrument};

use super::{DecisionForest, DecisionFunction, MlError, MlResult};
use crate::domain::{Classification, Severity};

/// Crash detector artifact file name
pub const CRASH_MODEL_FILE: &str = "crash_detector.json";

/// Severity model artifact file name
pub const SEVERITY_MODEL_FILE: &str = "severity_model.json";

/// Crash detector label meaning "crash"
const CRASH_LABEL: i64 = 1;

/// Artifact locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub crash: PathBuf,
    pub severity: PathBuf,
}

impl ModelPaths {
    /// Standard file names inside a models directory
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            crash: dir.join(CRASH_MODEL_FILE),
            severity: dir.join(SEVERITY_MODEL_FILE),
        }
    }
}

/// Both classifiers, loaded and validated
#[derive(Debug)]
pub struct LoadedModels {
    crash: Arc<dyn DecisionFunction>,
    severity: Arc<dyn DecisionFunction>,
}

impl LoadedModels {
    /// Pair two decision functions, checking their arity against the
    /// feature vectors they will receive.
    pub fn new(
        crash: Arc<dyn DecisionFunction>,
        severity: Arc<dyn DecisionFunction>,
        paths: &ModelPaths,
    ) -> MlResult<Self> {
        check_arity(crash.as_ref(), CRASH_FEATURE_COUNT, &paths.crash)?;
        check_arity(severity.as_ref(), SEVERITY_FEATURE_COUNT, &paths.severity)?;
        Ok(Self { crash, severity })
    }
}

fn check_arity(model: &dyn DecisionFunction, expected: usize, path: &Path) -> MlResult<()> {
    if model.n_features() != expected {
        return Err(MlError::corrupt(
            path,
            format!(
                "expects {} features, feature vector has {}",
                model.n_features(),
                expected
            ),
        ));
    }
    Ok(())
}

/// Proof that the crash detector returned a positive verdict.
///
/// Only [`ClassifierGateway::classify_crash`] can create one, which makes
/// severity grading unreachable for events that were not classified as
/// crashes.
#[derive(Debug)]
pub struct ConfirmedCrash {
    _private: (),
}

/// Crash detector outcome
#[derive(Debug)]
pub enum CrashVerdict {
    NoCrash,
    Crash(ConfirmedCrash),
}

impl CrashVerdict {
    pub fn is_crash(&self) -> bool {
        matches!(self, CrashVerdict::Crash(_))
    }
}

/// Two-stage classifier with a one-time, shared model load.
///
/// The first successful [`load`](Self::load) is cached for the lifetime of
/// the gateway; concurrent first callers perform exactly one load. Failed
/// loads are not cached, so a later call retries.
pub struct ClassifierGateway {
    paths: ModelPaths,
    models: RwLock<Option<Arc<LoadedModels>>>,
    load_count: AtomicUsize,
}

impl std::fmt::Debug for ClassifierGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierGateway")
            .field("paths", &self.paths)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl ClassifierGateway {
    /// Gateway that loads the given artifacts on first use
    pub fn new(paths: ModelPaths) -> Self {
        Self {
            paths,
            models: RwLock::new(None),
            load_count: AtomicUsize::new(0),
        }
    }

    /// Gateway over `crash_detector.json` and `severity_model.json` in `dir`
    pub fn from_models_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(ModelPaths::in_dir(dir))
    }

    /// Gateway over already-constructed decision functions
    pub fn from_functions(
        crash: Arc<dyn DecisionFunction>,
        severity: Arc<dyn DecisionFunction>,
    ) -> MlResult<Self> {
        let paths = ModelPaths {
            crash: PathBuf::from("<memory:crash>"),
            severity: PathBuf::from("<memory:severity>"),
        };
        let models = LoadedModels::new(crash, severity, &paths)?;
        Ok(Self {
            paths,
            models: RwLock::new(Some(Arc::new(models))),
            load_count: AtomicUsize::new(0),
        })
    }

    /// Artifact locations
    pub fn paths(&self) -> &ModelPaths {
        &self.paths
    }

    /// True once models are cached
    pub fn is_loaded(&self) -> bool {
        self.models.read().is_some()
    }

    /// Number of artifact loads performed (successful or not)
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Load both models, or return the cached pair.
    pub fn load(&self) -> MlResult<Arc<LoadedModels>> {
        if let Some(models) = self.models.read().as_ref() {
            return Ok(Arc::clone(models));
        }

        let mut slot = self.models.write();
        // Another caller may have loaded while we waited for the lock.
        if let Some(models) = slot.as_ref() {
            return Ok(Arc::clone(models));
        }

        self.load_count.fetch_add(1, Ordering::SeqCst);
        match self.load_from_disk() {
            Ok(models) => {
                let models = Arc::new(models);
                *slot = Some(Arc::clone(&models));
                info!(
                    crash = %self.paths.crash.display(),
                    severity = %self.paths.severity.display(),
                    "Classifier models loaded"
                );
                Ok(models)
            }
            Err(e) => {
                error!(error = %e, "Failed to load classifier models");
                Err(e)
            }
        }
    }

    fn load_from_disk(&self) -> MlResult<LoadedModels> {
        // Both must exist before either is parsed.
        for path in [&self.paths.crash, &self.paths.severity] {
            if !path.is_file() {
                return Err(MlError::ModelNotFound(path.clone()));
            }
        }

        let crash = read_forest(&self.paths.crash)?;
        let severity = read_forest(&self.paths.severity)?;
        LoadedModels::new(Arc::new(crash), Arc::new(severity), &self.paths)
    }

    /// Run the crash detector.
    #[instrument(skip_all)]
    pub fn classify_crash(&self, features: &CrashFeatures) -> MlResult<CrashVerdict> {
        let models = self.load()?;
        let label = models.crash.predict(features.as_slice());
        tracing::debug!(label, "Crash detector label");

        Ok(if label == CRASH_LABEL {
            CrashVerdict::Crash(ConfirmedCrash { _private: () })
        } else {
            CrashVerdict::NoCrash
        })
    }

    /// Grade a confirmed crash.
    #[instrument(skip_all)]
    pub fn classify_severity(
        &self,
        _crash: &ConfirmedCrash,
        features: &SeverityFeatures,
    ) -> MlResult<Severity> {
        let models = self.load()?;
        let label = models.severity.predict(features.as_slice());
        tracing::debug!(label, "Severity label");
        Ok(Severity::from_label(label))
    }

    /// Run both stages; severity only when a crash is detected.
    pub fn classify(
        &self,
        crash: &CrashFeatures,
        severity: &SeverityFeatures,
    ) -> MlResult<Classification> {
        match self.classify_crash(crash)? {
            CrashVerdict::NoCrash => Ok(Classification::no_crash()),
            CrashVerdict::Crash(confirmed) => {
                let grade = self.classify_severity(&confirmed, severity)?;
                Ok(Classification::crash(grade))
            }
        }
    }
}

fn read_forest(path: &Path) -> MlResult<DecisionForest> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MlError::ModelNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(MlError::corrupt(path, format!("unreadable: {}", e))),
    };
    DecisionForest::from_json_slice(&bytes).map_err(|reason| MlError::corrupt(path, reason))
}
