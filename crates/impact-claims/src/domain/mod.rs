//! Domain module containing the claim entity and the value objects that
//! make up a classification outcome.
//!
//! - **Entities**: [`Claim`] (identity: [`ClaimId`])
//! - **Value Objects**: [`Classification`], [`EscalationRecord`],
//!   [`ClassificationResult`]

pub mod claim;
pub mod classification;
pub mod escalation;

// Re-export all domain types
pub use claim::*;
pub use classification::*;
pub use escalation::*;
