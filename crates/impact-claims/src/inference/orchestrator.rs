//! Sequencing of one event through the claim pipeline.

use std::path::Path;
use std::sync::Arc;

use impact_signal::{imu, EventFeatures, EventMetadata, FeatureExtractor};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::alerting::EscalationPolicy;
use crate::config::ImpactConfig;
use crate::domain::{ClaimId, Classification, ClassificationResult};
use crate::ingest::{ArchiveExtractor, EventLocator, EventRoot, RequestWorkspace};
use crate::ml::ClassifierGateway;
use crate::store::ClaimStore;
use crate::{ImpactError, Result};

/// Pipeline stage reached by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Received,
    Located,
    FeaturesExtracted,
    Classified,
    EscalationEvaluated,
    Persisted,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Located => "located",
            Stage::FeaturesExtracted => "features_extracted",
            Stage::Classified => "classified",
            Stage::EscalationEvaluated => "escalation_evaluated",
            Stage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Response for a processed upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub claim_id: ClaimId,
    pub result: ClassificationResult,
}

/// Runs events through extraction, classification, escalation and
/// persistence. Stateless between requests; safe to share.
pub struct InferenceOrchestrator {
    gateway: Arc<ClassifierGateway>,
    store: Arc<dyn ClaimStore>,
    policy: EscalationPolicy,
    extractor: FeatureExtractor,
    archive: ArchiveExtractor,
    locator: EventLocator,
    events_dir: std::path::PathBuf,
}

impl InferenceOrchestrator {
    pub fn new(
        config: &ImpactConfig,
        gateway: Arc<ClassifierGateway>,
        store: Arc<dyn ClaimStore>,
    ) -> Self {
        Self {
            gateway,
            store,
            policy: EscalationPolicy::from_config(config),
            extractor: FeatureExtractor::inference(),
            archive: ArchiveExtractor::new(config.archive_limits),
            locator: EventLocator::new(),
            events_dir: config.events_dir(),
        }
    }

    pub fn gateway(&self) -> &Arc<ClassifierGateway> {
        &self.gateway
    }

    pub fn store(&self) -> &Arc<dyn ClaimStore> {
        &self.store
    }

    /// Process one uploaded archive into a persisted claim.
    ///
    /// The request workspace is removed on any failure; on success it is
    /// kept as `<events>/<claim-id>/`.
    pub fn process_archive(&self, bytes: &[u8]) -> Result<ClaimOutcome> {
        let workspace = RequestWorkspace::create(&self.events_dir)?;
        let span = info_span!("process_archive", request_id = %workspace.request_id());
        let _enter = span.enter();

        log_stage(Stage::Received);
        workspace.write_upload(bytes)?;
        let root = workspace.extraction_root();
        self.archive.extract_bytes(bytes, &root)?;

        let event = self.locator.resolve(&root)?;
        log_stage(Stage::Located);

        let outcome = self.process_located(&event)?;

        if let Err(e) = workspace.retain_as(&outcome.claim_id.to_string()) {
            warn!(claim_id = %outcome.claim_id, error = %e, "Could not retain event workspace");
        }
        Ok(outcome)
    }

    /// Process an event directory already on disk into a persisted claim.
    pub fn process_event_dir(&self, dir: &Path) -> Result<ClaimOutcome> {
        let event = self.locator.resolve(dir)?;
        log_stage(Stage::Located);
        self.process_located(&event)
    }

    /// Classify an event directory without persisting or escalating.
    pub fn classify_event_dir(&self, dir: &Path) -> Result<Classification> {
        let event = self.locator.resolve(dir)?;
        let features = self.extract(&event)?;
        Ok(self.gateway.classify(&features.crash, &features.severity)?)
    }

    fn process_located(&self, event: &EventRoot) -> Result<ClaimOutcome> {
        let features = self.extract(event)?;
        log_stage(Stage::FeaturesExtracted);

        let classification = self.gateway.classify(&features.crash, &features.severity)?;
        info!(
            stage = %Stage::Classified,
            crash = classification.is_crash(),
            severity = ?classification.severity(),
            "Event classified"
        );

        let reservation = self.store.reserve();
        let escalation = self.policy.evaluate(&classification, reservation.id());
        if escalation.emergency_required {
            warn!(
                claim_id = %reservation.id(),
                contacts = escalation.emergency_contacts.len(),
                "Emergency escalation required"
            );
        }
        log_stage(Stage::EscalationEvaluated);

        let result = ClassificationResult::new(classification, escalation);
        let claim = self
            .store
            .commit(reservation, result)
            .map_err(|e| match e {
                ImpactError::PersistenceFailed(_) => e,
                other => ImpactError::PersistenceFailed(other.to_string()),
            })?;
        info!(stage = %Stage::Persisted, claim_id = %claim.claim_id, "Claim persisted");

        Ok(ClaimOutcome {
            claim_id: claim.claim_id,
            result: claim.result,
        })
    }

    fn extract(&self, event: &EventRoot) -> Result<EventFeatures> {
        match EventMetadata::read_from_dir(event.path()) {
            Ok(Some(meta)) => info!(
                sampling_hz = ?meta.sampling_hz,
                duration_s = ?meta.duration_s,
                "Event metadata"
            ),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable event metadata"),
        }

        let series = match imu::read_imu_csv(event.imu_path()) {
            Ok(series) => series,
            Err(impact_signal::SignalError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImpactError::EventLayoutAmbiguous(format!(
                    "{} disappeared from {}",
                    impact_signal::IMU_FILE,
                    event.path().display()
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let features = self.extractor.extract(&series)?;
        if !features.crash.is_finite() || !features.severity.is_finite() {
            return Err(ImpactError::MalformedEventData(
                "feature vector contains non-finite values".into(),
            ));
        }
        Ok(features)
    }
}

fn log_stage(stage: Stage) {
    info!(%stage, "Pipeline stage reached");
}
