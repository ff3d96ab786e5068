//! Vote casting domain service.
//!
//! The ledger is written first and is authoritative. Aggregates are updated
//! only after the ledger transaction commits; if that update fails the
//! service re-derives every aggregate from the ledger instead of retrying
//! the increment, which could double count. The rebuild runs under the
//! exclusive side of the [`TallyGate`] so it cannot race other ballots.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLockReadGuard;
use tracing::{error, info, warn};

use crate::domain::admin_service::{map_ledger_write_error, rederive_aggregates};
use crate::domain::ports::{
    AggregateStore, LedgerError, PageCache, VoteCommand, VoteLedger, VoteMetrics, VoteOutcome,
};
use crate::domain::{Ballot, CandidateRegistry, ElectionError, TallyGate, VoteReceipt, VoteRequest};

/// Service implementing [`VoteCommand`].
#[derive(Clone)]
pub struct VoteService<L, A> {
    ledger: Arc<L>,
    aggregates: Arc<A>,
    registry: Arc<CandidateRegistry>,
    page_cache: Arc<dyn PageCache>,
    metrics: Arc<dyn VoteMetrics>,
    gate: Arc<TallyGate>,
}

impl<L, A> VoteService<L, A> {
    /// Create a new service over the given stores.
    pub fn new(
        ledger: Arc<L>,
        aggregates: Arc<A>,
        registry: Arc<CandidateRegistry>,
        page_cache: Arc<dyn PageCache>,
        metrics: Arc<dyn VoteMetrics>,
        gate: Arc<TallyGate>,
    ) -> Self {
        Self {
            ledger,
            aggregates,
            registry,
            page_cache,
            metrics,
            gate,
        }
    }
}

impl<L, A> VoteService<L, A>
where
    L: VoteLedger,
    A: AggregateStore,
{
    fn map_record_error(error: LedgerError, requested: u32) -> ElectionError {
        match error {
            LedgerError::QuotaExceeded { remaining } => ElectionError::QuotaExceeded {
                requested,
                remaining,
            },
            other => map_ledger_write_error(other),
        }
    }

    async fn try_cast(&self, request: VoteRequest) -> Result<VoteReceipt, ElectionError> {
        let count = request.validate_shape()?;

        let directory = self.registry.snapshot();
        let candidate = directory
            .resolve(&request.candidate)
            .ok_or_else(|| ElectionError::unknown_candidate(request.candidate.trim()))?;

        let voter = self
            .ledger
            .find_voter(&request.credentials.my_number)
            .await
            .map_err(map_ledger_write_error)?
            .filter(|voter| voter.matches(&request.credentials))
            .ok_or(ElectionError::UserNotFound)?;

        if !voter.can_cast(count) {
            return Err(ElectionError::QuotaExceeded {
                requested: count,
                remaining: voter.remaining(),
            });
        }

        let ballot = Ballot {
            voter_id: voter.id,
            candidate_id: candidate.id,
            political_party: candidate.political_party.clone(),
            keyword: request.keyword.trim().to_owned(),
            count,
        };
        let in_flight = self.gate.ballot().await;
        let receipt = self
            .ledger
            .record_ballot(&ballot)
            .await
            .map_err(|err| Self::map_record_error(err, count))?;
        let aggregates_current = self.publish_aggregates(&ballot, in_flight).await;
        self.page_cache.flush();

        info!(
            voter_id = %ballot.voter_id,
            candidate_id = %ballot.candidate_id,
            count,
            candidate_total = receipt.candidate_total,
            aggregates_current,
            "vote recorded"
        );

        Ok(VoteReceipt {
            candidate_id: ballot.candidate_id,
            count,
            remaining: voter.quota.saturating_sub(receipt.voter_used),
            aggregates_current,
        })
    }

    /// Apply a committed ballot to the aggregate store.
    ///
    /// On failure the ballot's share of the gate is released and the
    /// aggregates are rebuilt under the exclusive side, so no other ballot
    /// can commit or apply while the ledger tally is read and written back.
    /// Returns whether the aggregates reflect the ledger afterwards.
    async fn publish_aggregates(
        &self,
        ballot: &Ballot,
        in_flight: RwLockReadGuard<'_, ()>,
    ) -> bool {
        let applied = self.aggregates.apply_ballot(ballot).await;
        drop(in_flight);
        let Err(apply_error) = applied else {
            return true;
        };
        error!(
            candidate_id = %ballot.candidate_id,
            error = %apply_error,
            "aggregate update failed after ledger commit; rebuilding from ledger"
        );

        let _exclusive = self.gate.exclusive().await;
        let directory = self.registry.snapshot();
        match rederive_aggregates(self.ledger.as_ref(), self.aggregates.as_ref(), &directory).await
        {
            Ok(()) => {
                warn!(candidate_id = %ballot.candidate_id, "aggregates rebuilt from ledger");
                true
            }
            Err(rebuild_error) => {
                error!(
                    error = %rebuild_error,
                    "aggregate rebuild failed; aggregates lag the ledger until the next rebuild"
                );
                false
            }
        }
    }

    async fn record_outcome(&self, result: &Result<VoteReceipt, ElectionError>, votes: u32) {
        let outcome = match result {
            Ok(_) => VoteOutcome::Accepted,
            Err(err) if err.is_infrastructure() => VoteOutcome::Failed,
            Err(_) => VoteOutcome::Rejected,
        };
        if let Err(err) = self.metrics.record(outcome, votes).await {
            warn!(error = %err, outcome = outcome.as_str(), "failed to record vote metrics");
        }
    }
}

#[async_trait]
impl<L, A> VoteCommand for VoteService<L, A>
where
    L: VoteLedger,
    A: AggregateStore,
{
    async fn cast_vote(&self, request: VoteRequest) -> Result<VoteReceipt, ElectionError> {
        let votes = u32::try_from(request.count).unwrap_or(0);
        let result = self.try_cast(request).await;
        self.record_outcome(&result, votes).await;
        result
    }
}

#[cfg(test)]
#[path = "vote_service_tests.rs"]
mod tests;
