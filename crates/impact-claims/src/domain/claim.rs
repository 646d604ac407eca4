//! Claim entity: the persisted, immutable outcome for one event.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ClassificationResult;

/// Unique identifier for a claim.
///
/// New ids are only minted by a claim store; anything else can only parse
/// an existing id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(Uuid);

impl ClaimId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a textual id; `None` when it is not a UUID
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }
}

impl std::fmt::Display for ClaimId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ClaimId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A persisted classification outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Store-assigned identifier
    pub claim_id: ClaimId,
    /// When the claim was committed
    pub created_at: DateTime<Utc>,
    /// Classification and escalation outcome
    pub result: ClassificationResult,
}

impl Claim {
    pub(crate) fn new(claim_id: ClaimId, result: ClassificationResult) -> Self {
        Self {
            claim_id,
            created_at: Utc::now(),
            result,
        }
    }
}
