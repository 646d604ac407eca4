//! Alerting module for emergency escalation.

mod escalation;

pub use escalation::{EscalationPolicy, CLAIM_ID_PLACEHOLDER, DEFAULT_ESCALATION_TEMPLATE};
