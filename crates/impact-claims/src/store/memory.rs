//! In-memory claim store for tests and ephemeral deployments.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{ClaimReservation, ClaimStore};
use crate::domain::{Claim, ClaimId, ClassificationResult};
use crate::{ImpactError, Result};

/// Claim store backed by a `BTreeMap`
#[derive(Debug, Default)]
pub struct InMemoryClaimStore {
    claims: RwLock<BTreeMap<ClaimId, Claim>>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored claims
    pub fn len(&self) -> usize {
        self.claims.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.read().is_empty()
    }
}

impl ClaimStore for InMemoryClaimStore {
    fn commit(&self, reservation: ClaimReservation, result: ClassificationResult) -> Result<Claim> {
        let id = reservation.into_id();
        let mut claims = self.claims.write();
        if claims.contains_key(&id) {
            return Err(ImpactError::PersistenceFailed(format!("claim {} already exists", id)));
        }
        let claim = Claim::new(id, result);
        claims.insert(id, claim.clone());
        Ok(claim)
    }

    fn get_claim(&self, claim_id: &ClaimId) -> Result<Claim> {
        self.claims
            .read()
            .get(claim_id)
            .cloned()
            .ok_or_else(|| ImpactError::NotFound(claim_id.to_string()))
    }

    fn list(&self) -> Result<Vec<ClaimId>> {
        // Uuid ordering is bytewise, which matches the ordering of the
        // lowercase hyphenated text form.
        Ok(self.claims.read().keys().copied().collect())
    }
}
