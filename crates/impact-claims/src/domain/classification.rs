//! Classification outcome value objects.

use serde::{Deserialize, Serialize};

use super::EscalationRecord;

/// Impact severity of a confirmed crash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Light,
    Heavy,
}

impl Severity {
    /// Map a severity model label; any non-zero label is heavy
    pub fn from_label(label: i64) -> Self {
        if label != 0 {
            Severity::Heavy
        } else {
            Severity::Light
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Light => "light",
            Severity::Heavy => "heavy",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the two-stage classifier.
///
/// Severity is present exactly on a crash; the constructors and the
/// validating deserializer are the only ways to build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClassification")]
pub struct Classification {
    crash: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
}

impl Classification {
    /// No impact detected
    pub fn no_crash() -> Self {
        Self {
            crash: false,
            severity: None,
        }
    }

    /// Impact detected with the given severity
    pub fn crash(severity: Severity) -> Self {
        Self {
            crash: true,
            severity: Some(severity),
        }
    }

    pub fn is_crash(&self) -> bool {
        self.crash
    }

    pub fn severity(&self) -> Option<Severity> {
        self.severity
    }

    /// Crash with heavy severity
    pub fn is_heavy_crash(&self) -> bool {
        self.crash && self.severity == Some(Severity::Heavy)
    }
}

#[derive(Deserialize)]
struct RawClassification {
    crash: bool,
    #[serde(default)]
    severity: Option<Severity>,
}

impl TryFrom<RawClassification> for Classification {
    type Error = String;

    fn try_from(raw: RawClassification) -> Result<Self, Self::Error> {
        match (raw.crash, raw.severity) {
            (false, None) => Ok(Self::no_crash()),
            (true, Some(severity)) => Ok(Self::crash(severity)),
            (false, Some(severity)) => Err(format!("severity '{}' without a crash", severity)),
            (true, None) => Err("crash without a severity".to_string()),
        }
    }
}

/// Classification plus escalation, as returned to clients and persisted.
///
/// Serialized flat:
/// `{crash, severity?, emergency_required, emergency_contacts, emergency_message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClassificationResult")]
pub struct ClassificationResult {
    #[serde(flatten)]
    classification: Classification,
    #[serde(flatten)]
    escalation: EscalationRecord,
}

impl ClassificationResult {
    /// Combine a classification with its escalation record
    pub fn new(classification: Classification, escalation: EscalationRecord) -> Self {
        debug_assert_eq!(
            escalation.emergency_required,
            classification.is_heavy_crash(),
            "escalation must be required exactly for heavy crashes"
        );
        Self {
            classification,
            escalation,
        }
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn escalation(&self) -> &EscalationRecord {
        &self.escalation
    }

    pub fn crash(&self) -> bool {
        self.classification.is_crash()
    }

    pub fn severity(&self) -> Option<Severity> {
        self.classification.severity()
    }

    pub fn emergency_required(&self) -> bool {
        self.escalation.emergency_required
    }
}

#[derive(Deserialize)]
struct RawClassificationResult {
    #[serde(flatten)]
    classification: Classification,
    #[serde(flatten)]
    escalation: EscalationRecord,
}

impl TryFrom<RawClassificationResult> for ClassificationResult {
    type Error = String;

    fn try_from(raw: RawClassificationResult) -> Result<Self, Self::Error> {
        let heavy = raw.classification.is_heavy_crash();
        let escalation = &raw.escalation;
        if escalation.emergency_required != heavy {
            return Err(format!(
                "emergency_required is {} but the classification is {}heavy",
                escalation.emergency_required,
                if heavy { "" } else { "not " }
            ));
        }
        if !heavy && (!escalation.emergency_contacts.is_empty() || !escalation.emergency_message.is_empty()) {
            return Err("contacts or message on a result that needs no escalation".to_string());
        }
        Ok(Self {
            classification: raw.classification,
            escalation: raw.escalation,
        })
    }
}
