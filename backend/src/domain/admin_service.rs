//! Administrative domain service: resets, directory loads, and re-derivation
//! of every aggregate from the ledger.
//!
//! Every operation here holds the [`TallyGate`] exclusively, so none of them
//! observes a ballot that has committed to the ledger but not yet reached
//! the aggregates.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{
    AggregateCollection, AggregateSnapshot, AggregateStore, AggregateStoreError, ElectionAdmin,
    LedgerError, LedgerTally, PageCache, ScoredMember, VoteLedger, candidate_member,
};
use crate::domain::{
    CandidateDirectory, CandidateId, CandidateRegistry, ElectionError, TallyDrift, TallyGate,
};

/// Service implementing [`ElectionAdmin`].
#[derive(Clone)]
pub struct ElectionAdminService<L, A> {
    ledger: Arc<L>,
    aggregates: Arc<A>,
    registry: Arc<CandidateRegistry>,
    page_cache: Arc<dyn PageCache>,
    gate: Arc<TallyGate>,
}

impl<L, A> ElectionAdminService<L, A> {
    /// Create a service over the given stores.
    pub fn new(
        ledger: Arc<L>,
        aggregates: Arc<A>,
        registry: Arc<CandidateRegistry>,
        page_cache: Arc<dyn PageCache>,
        gate: Arc<TallyGate>,
    ) -> Self {
        Self {
            ledger,
            aggregates,
            registry,
            page_cache,
            gate,
        }
    }
}

pub(crate) fn map_ledger_write_error(error: LedgerError) -> ElectionError {
    ElectionError::store_unavailable(format!("vote ledger: {error}"))
}

pub(crate) fn map_ledger_read_error(error: LedgerError) -> ElectionError {
    ElectionError::query_failed(format!("vote ledger: {error}"))
}

pub(crate) fn map_aggregate_write_error(error: AggregateStoreError) -> ElectionError {
    ElectionError::store_unavailable(format!("aggregate store: {error}"))
}

pub(crate) fn map_aggregate_read_error(error: AggregateStoreError) -> ElectionError {
    ElectionError::query_failed(format!("aggregate store: {error}"))
}

/// Build the full aggregate contents implied by a ledger tally.
///
/// Every directory candidate appears in the global ranking, at zero when it
/// has no votes. Keyword records for candidates missing from the directory
/// still count toward the candidate collections but cannot be attributed to
/// a party.
pub(crate) fn derive_snapshot(
    tally: &LedgerTally,
    directory: &CandidateDirectory,
) -> AggregateSnapshot {
    let mut global: BTreeMap<CandidateId, i64> = directory
        .candidates()
        .iter()
        .map(|candidate| (candidate.id, 0))
        .collect();
    for (id, votes) in &tally.candidate_totals {
        global.insert(*id, *votes);
    }

    let mut by_candidate: BTreeMap<CandidateId, BTreeMap<&str, i64>> = BTreeMap::new();
    let mut by_party: BTreeMap<&str, BTreeMap<&str, i64>> = BTreeMap::new();
    for record in &tally.keyword_totals {
        *by_candidate
            .entry(record.candidate_id)
            .or_default()
            .entry(record.keyword.as_str())
            .or_default() += record.votes;
        match directory.by_id(record.candidate_id) {
            Some(candidate) => {
                *by_party
                    .entry(candidate.political_party.as_str())
                    .or_default()
                    .entry(record.keyword.as_str())
                    .or_default() += record.votes;
            }
            None => warn!(
                candidate_id = %record.candidate_id,
                "keyword tally references a candidate outside the directory"
            ),
        }
    }

    let mut collections = Vec::with_capacity(1 + by_candidate.len() + by_party.len());
    collections.push((
        AggregateCollection::Candidates,
        global
            .into_iter()
            .map(|(id, votes)| ScoredMember::new(candidate_member(id), votes))
            .collect(),
    ));
    collections.extend(by_candidate.into_iter().map(|(id, keywords)| {
        (
            AggregateCollection::CandidateKeywords(id),
            scored(keywords),
        )
    }));
    collections.extend(by_party.into_iter().map(|(party, keywords)| {
        (
            AggregateCollection::PartyKeywords(party.to_owned()),
            scored(keywords),
        )
    }));

    AggregateSnapshot {
        collections,
        voter_totals: tally.voter_totals.clone(),
    }
}

fn scored(keywords: BTreeMap<&str, i64>) -> Vec<ScoredMember> {
    keywords
        .into_iter()
        .map(|(keyword, votes)| ScoredMember::new(keyword, votes))
        .collect()
}

/// Replace the aggregate store contents with values derived from the ledger.
pub(crate) async fn rederive_aggregates<L, A>(
    ledger: &L,
    aggregates: &A,
    directory: &CandidateDirectory,
) -> Result<(), ElectionError>
where
    L: VoteLedger + ?Sized,
    A: AggregateStore + ?Sized,
{
    let tally = ledger.tally().await.map_err(map_ledger_write_error)?;
    let snapshot = derive_snapshot(&tally, directory);
    aggregates
        .replace_all(&snapshot)
        .await
        .map_err(map_aggregate_write_error)
}

impl<L, A> ElectionAdminService<L, A>
where
    L: VoteLedger,
    A: AggregateStore,
{
    async fn fetch_directory(&self) -> Result<CandidateDirectory, ElectionError> {
        let candidates = self
            .ledger
            .list_candidates()
            .await
            .map_err(map_ledger_write_error)?;
        Ok(CandidateDirectory::new(candidates))
    }

    async fn seed(&self, directory: &CandidateDirectory) -> Result<(), ElectionError> {
        let ids: Vec<CandidateId> = directory
            .candidates()
            .iter()
            .map(|candidate| candidate.id)
            .collect();
        self.aggregates
            .seed_candidates(&ids)
            .await
            .map_err(map_aggregate_write_error)
    }
}

#[async_trait]
impl<L, A> ElectionAdmin for ElectionAdminService<L, A>
where
    L: VoteLedger,
    A: AggregateStore,
{
    async fn reset(&self) -> Result<(), ElectionError> {
        let _exclusive = self.gate.exclusive().await;
        self.ledger
            .reset_votes()
            .await
            .map_err(map_ledger_write_error)?;
        self.aggregates
            .clear()
            .await
            .map_err(map_aggregate_write_error)?;

        let directory = self.fetch_directory().await?;
        self.seed(&directory).await?;
        let candidates = directory.len();
        self.registry.publish(directory);
        self.page_cache.flush();

        info!(candidates, "election reset");
        Ok(())
    }

    async fn load_directory(&self) -> Result<usize, ElectionError> {
        let _exclusive = self.gate.exclusive().await;
        let directory = self.fetch_directory().await?;
        self.seed(&directory).await?;
        let candidates = directory.len();
        self.registry.publish(directory);
        info!(candidates, "candidate directory loaded");
        Ok(candidates)
    }

    async fn rebuild_aggregates(&self) -> Result<(), ElectionError> {
        let _exclusive = self.gate.exclusive().await;
        let directory = self.fetch_directory().await?;
        rederive_aggregates(self.ledger.as_ref(), self.aggregates.as_ref(), &directory).await?;
        let candidates = directory.len();
        self.registry.publish(directory);
        self.page_cache.flush();
        info!(candidates, "aggregates rebuilt from ledger");
        Ok(())
    }

    async fn audit(&self) -> Result<Vec<TallyDrift>, ElectionError> {
        let _exclusive = self.gate.exclusive().await;
        let tally = self.ledger.tally().await.map_err(map_ledger_read_error)?;
        let directory = self.registry.snapshot();

        let mut ids: Vec<CandidateId> = directory
            .candidates()
            .iter()
            .map(|candidate| candidate.id)
            .chain(tally.candidate_totals.iter().map(|(id, _)| *id))
            .chain(tally.keyword_totals.iter().map(|record| record.candidate_id))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let mut drift = Vec::new();
        for id in ids {
            let aggregate_votes = self
                .aggregates
                .score_of(&AggregateCollection::Candidates, &candidate_member(id))
                .await
                .map_err(map_aggregate_read_error)?
                .unwrap_or(0);
            let entry = TallyDrift {
                candidate_id: id,
                record_votes: tally.record_total(id),
                counter_votes: tally.candidate_total(id),
                aggregate_votes,
            };
            if !entry.is_consistent() {
                warn!(
                    candidate_id = %id,
                    record_votes = entry.record_votes,
                    counter_votes = entry.counter_votes,
                    aggregate_votes = entry.aggregate_votes,
                    "tally drift detected"
                );
                drift.push(entry);
            }
        }
        Ok(drift)
    }
}

#[cfg(test)]
#[path = "admin_service_tests.rs"]
mod tests;
