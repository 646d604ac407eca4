//! Escalation policy: heavy crashes notify the configured contacts.

use crate::config::ImpactConfig;
use crate::domain::{ClaimId, Classification, EscalationRecord};

/// Placeholder replaced with the claim id in the message template
pub const CLAIM_ID_PLACEHOLDER: &str = "{claim_id}";

/// Default escalation message
pub const DEFAULT_ESCALATION_TEMPLATE: &str =
    "IMPACT alert: heavy crash detected (claim {claim_id}). Immediate assistance required.";

/// Decides whether a classification escalates and builds the record
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    contacts: Vec<String>,
    template: String,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_ESCALATION_TEMPLATE)
    }
}

impl EscalationPolicy {
    /// Create a policy with explicit contacts and template
    pub fn new(contacts: Vec<String>, template: impl Into<String>) -> Self {
        Self {
            contacts,
            template: template.into(),
        }
    }

    /// Policy from service configuration
    pub fn from_config(config: &ImpactConfig) -> Self {
        Self::new(
            config.emergency_contacts.clone(),
            config.escalation_template.clone(),
        )
    }

    /// Configured contacts
    pub fn contacts(&self) -> &[String] {
        &self.contacts
    }

    /// Escalation record for a classified event.
    ///
    /// Required exactly when the event is a heavy crash; otherwise the
    /// record is inert (no contacts, empty message).
    pub fn evaluate(&self, classification: &Classification, claim_id: &ClaimId) -> EscalationRecord {
        if !classification.is_heavy_crash() {
            return EscalationRecord::inert();
        }

        if self.contacts.is_empty() {
            tracing::warn!(%claim_id, "Heavy crash escalated with no emergency contacts configured");
        }

        EscalationRecord::required(
            self.contacts.clone(),
            self.template
                .replace(CLAIM_ID_PLACEHOLDER, &claim_id.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    fn policy() -> EscalationPolicy {
        EscalationPolicy::new(vec!["112".into(), "+15550100".into()], DEFAULT_ESCALATION_TEMPLATE)
    }

    #[test]
    fn test_heavy_crash_escalates() {
        let id = ClaimId::generate();
        let record = policy().evaluate(&Classification::crash(Severity::Heavy), &id);

        assert!(record.emergency_required);
        assert_eq!(record.emergency_contacts, vec!["112", "+15550100"]);
        assert!(record.emergency_message.contains(&id.to_string()));
        assert!(!record.emergency_message.contains(CLAIM_ID_PLACEHOLDER));
    }

    #[test]
    fn test_other_outcomes_are_inert() {
        let id = ClaimId::generate();
        for classification in [Classification::no_crash(), Classification::crash(Severity::Light)] {
            let record = policy().evaluate(&classification, &id);
            assert_eq!(record, EscalationRecord::inert());
            assert!(record.emergency_contacts.is_empty());
            assert_eq!(record.emergency_message, "");
        }
    }

    #[test]
    fn test_custom_template() {
        let id = ClaimId::generate();
        let policy = EscalationPolicy::new(vec![], "ref={claim_id}");
        let record = policy.evaluate(&Classification::crash(Severity::Heavy), &id);
        assert_eq!(record.emergency_message, format!("ref={}", id));
        assert!(record.emergency_required);
    }
}
