//! Inference orchestration: archive → features → classification →
//! escalation → claim.

mod orchestrator;

pub use orchestrator::{ClaimOutcome, InferenceOrchestrator, Stage};
