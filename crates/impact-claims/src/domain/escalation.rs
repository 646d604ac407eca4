//! Emergency escalation record.

use serde::{Deserialize, Serialize};

/// Contact payload attached to every result.
///
/// Always fully populated: when `emergency_required` is false the contact
/// list is empty and the message is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub emergency_required: bool,
    #[serde(default)]
    pub emergency_contacts: Vec<String>,
    #[serde(default)]
    pub emergency_message: String,
}

impl EscalationRecord {
    /// No escalation
    pub fn inert() -> Self {
        Self::default()
    }

    /// Escalation with contacts and message
    pub fn required(contacts: Vec<String>, message: String) -> Self {
        Self {
            emergency_required: true,
            emergency_contacts: contacts,
            emergency_message: message,
        }
    }
}
