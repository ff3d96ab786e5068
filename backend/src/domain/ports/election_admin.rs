//! Driving port for administrative rebuilds.

use async_trait::async_trait;

use crate::domain::{ElectionError, TallyDrift};

/// Use-case port for resets and aggregate re-derivation.
///
/// Callers serialise these operations against live vote traffic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ElectionAdmin: Send + Sync {
    /// Clear all votes and aggregates, zero every counter, and reload the
    /// candidate directory. Safe to repeat.
    async fn reset(&self) -> Result<(), ElectionError>;

    /// Load the candidate directory from the ledger without touching votes.
    async fn load_directory(&self) -> Result<usize, ElectionError>;

    /// Recompute every aggregate from the ledger.
    async fn rebuild_aggregates(&self) -> Result<(), ElectionError>;

    /// Candidates whose ledger records, ledger counter, and aggregate score
    /// disagree. Empty when the stores are consistent.
    async fn audit(&self) -> Result<Vec<TallyDrift>, ElectionError>;
}
