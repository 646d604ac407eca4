//! Claim persistence.
//!
//! The store is the only component that assigns claim ids. Creation is
//! split into [`ClaimStore::reserve`] and [`ClaimStore::commit`] so the id
//! can be referenced (for example in an escalation message) before the
//! claim is written.

mod file;
mod memory;

pub use file::FileClaimStore;
pub use memory::InMemoryClaimStore;

use crate::domain::{Claim, ClaimId, ClassificationResult};
use crate::{ImpactError, Result};

/// An issued, not yet committed, claim id.
///
/// Not `Clone`: each reservation commits at most once.
#[derive(Debug)]
pub struct ClaimReservation {
    id: ClaimId,
}

impl ClaimReservation {
    pub(crate) fn issue() -> Self {
        Self {
            id: ClaimId::generate(),
        }
    }

    pub fn id(&self) -> &ClaimId {
        &self.id
    }

    pub(crate) fn into_id(self) -> ClaimId {
        self.id
    }
}

/// Append-only claim storage
pub trait ClaimStore: Send + Sync {
    /// Issue a fresh claim id
    fn reserve(&self) -> ClaimReservation {
        ClaimReservation::issue()
    }

    /// Durably persist a result under a reserved id.
    ///
    /// The claim is readable once this returns; a claim is never
    /// overwritten.
    fn commit(&self, reservation: ClaimReservation, result: ClassificationResult) -> Result<Claim>;

    /// Persist a result under a new id
    fn create(&self, result: ClassificationResult) -> Result<ClaimId> {
        let reservation = self.reserve();
        Ok(self.commit(reservation, result)?.claim_id)
    }

    /// Fetch a full claim record
    fn get_claim(&self, claim_id: &ClaimId) -> Result<Claim>;

    /// Fetch a result by textual id; malformed ids are not found
    fn get(&self, claim_id: &str) -> Result<ClassificationResult> {
        let id = ClaimId::parse(claim_id).ok_or_else(|| ImpactError::NotFound(claim_id.to_string()))?;
        Ok(self.get_claim(&id)?.result)
    }

    /// All claim ids in lexicographic order
    fn list(&self) -> Result<Vec<ClaimId>>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every backend must satisfy.

    use super::*;
    use crate::domain::{Classification, EscalationRecord, Severity};

    pub fn heavy() -> ClassificationResult {
        ClassificationResult::new(
            Classification::crash(Severity::Heavy),
            EscalationRecord::required(vec!["112".into()], "help".into()),
        )
    }

    pub fn quiet() -> ClassificationResult {
        ClassificationResult::new(Classification::no_crash(), EscalationRecord::inert())
    }

    pub fn create_then_get(store: &dyn ClaimStore) {
        let id = store.create(heavy()).unwrap();
        assert_eq!(store.get(&id.to_string()).unwrap(), heavy());
        let claim = store.get_claim(&id).unwrap();
        assert_eq!(claim.claim_id, id);
    }

    pub fn unknown_and_malformed_ids(store: &dyn ClaimStore) {
        let unknown = ClaimId::generate();
        assert!(matches!(store.get(&unknown.to_string()), Err(ImpactError::NotFound(_))));
        assert!(matches!(store.get("../../etc/passwd"), Err(ImpactError::NotFound(_))));
    }

    pub fn list_is_sorted(store: &dyn ClaimStore) {
        let mut created: Vec<String> = (0..5)
            .map(|_| store.create(quiet()).unwrap().to_string())
            .collect();
        created.sort();
        let listed: Vec<String> = store.list().unwrap().iter().map(|id| id.to_string()).collect();
        assert_eq!(listed, created);
    }

    pub fn reservation_visible_only_after_commit(store: &dyn ClaimStore) {
        let reservation = store.reserve();
        let id = *reservation.id();
        assert!(store.get_claim(&id).is_err());
        assert!(!store.list().unwrap().contains(&id));

        let claim = store.commit(reservation, quiet()).unwrap();
        assert_eq!(claim.claim_id, id);
        assert!(store.list().unwrap().contains(&id));
    }
}
