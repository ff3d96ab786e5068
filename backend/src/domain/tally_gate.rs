//! Coordination between ballots and whole-store aggregate rewrites.
//!
//! A ballot holds the gate shared from its ledger commit until its
//! aggregate increments land. Anything that reads the ledger tally and then
//! rewrites the aggregates (reset, rebuild, recovery after a failed
//! increment) or compares the two (audit) holds it exclusively. While the
//! exclusive side is held no ballot sits between "committed" and
//! "aggregated", so the tally it reads is exactly what the aggregates
//! should contain.

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared/exclusive gate over the ledger-to-aggregate pipeline.
#[derive(Debug, Default)]
pub struct TallyGate {
    lock: RwLock<()>,
}

impl TallyGate {
    /// Create an open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Held by a ballot across its ledger write and aggregate update.
    pub async fn ballot(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().await
    }

    /// Held while the aggregates are rebuilt from, or checked against, the
    /// ledger. Waits for in-flight ballots to finish.
    pub async fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().await
    }
}
