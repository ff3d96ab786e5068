//! In-process `AggregateStore` for tests and single-node deployments.
//!
//! Tie ordering matches Redis sorted sets: ascending reads order equal
//! scores by member ascending, descending reads by member descending.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{
    AggregateCollection, AggregateSnapshot, AggregateStore, AggregateStoreError, ScoredMember,
    candidate_member,
};
use crate::domain::{Ballot, CandidateId, VoterId};

#[derive(Debug, Default)]
struct State {
    collections: HashMap<AggregateCollection, HashMap<String, i64>>,
    voters: HashMap<VoterId, i64>,
}

impl State {
    fn bump(&mut self, collection: AggregateCollection, member: &str, delta: i64) -> i64 {
        let score = self
            .collections
            .entry(collection)
            .or_default()
            .entry(member.to_owned())
            .or_default();
        *score += delta;
        *score
    }

    fn ascending(&self, collection: &AggregateCollection) -> Vec<ScoredMember> {
        let mut members: Vec<ScoredMember> = self
            .collections
            .get(collection)
            .map(|scores| {
                scores
                    .iter()
                    .map(|(member, score)| ScoredMember::new(member.clone(), *score))
                    .collect()
            })
            .unwrap_or_default();
        members.sort_by(compare_ascending);
        members
    }
}

fn compare_ascending(a: &ScoredMember, b: &ScoredMember) -> Ordering {
    a.score.cmp(&b.score).then_with(|| a.member.cmp(&b.member))
}

/// Mutex-guarded aggregate store.
#[derive(Debug, Default)]
pub struct InMemoryAggregateStore {
    state: Mutex<State>,
}

impl InMemoryAggregateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AggregateStore for InMemoryAggregateStore {
    async fn increment(
        &self,
        collection: &AggregateCollection,
        member: &str,
        delta: i64,
    ) -> Result<i64, AggregateStoreError> {
        Ok(self.lock().bump(collection.clone(), member, delta))
    }

    async fn apply_ballot(&self, ballot: &Ballot) -> Result<(), AggregateStoreError> {
        let count = i64::from(ballot.count);
        let mut state = self.lock();
        state.bump(
            AggregateCollection::CandidateKeywords(ballot.candidate_id),
            &ballot.keyword,
            count,
        );
        state.bump(
            AggregateCollection::PartyKeywords(ballot.political_party.clone()),
            &ballot.keyword,
            count,
        );
        state.bump(
            AggregateCollection::Candidates,
            &candidate_member(ballot.candidate_id),
            count,
        );
        *state.voters.entry(ballot.voter_id).or_default() += count;
        Ok(())
    }

    async fn top_n(
        &self,
        collection: &AggregateCollection,
        n: usize,
    ) -> Result<Vec<ScoredMember>, AggregateStoreError> {
        let mut members = self.lock().ascending(collection);
        members.reverse();
        members.truncate(n);
        Ok(members)
    }

    async fn bottom(
        &self,
        collection: &AggregateCollection,
    ) -> Result<Option<ScoredMember>, AggregateStoreError> {
        Ok(self.lock().ascending(collection).into_iter().next())
    }

    async fn score_of(
        &self,
        collection: &AggregateCollection,
        member: &str,
    ) -> Result<Option<i64>, AggregateStoreError> {
        Ok(self
            .lock()
            .collections
            .get(collection)
            .and_then(|scores| scores.get(member))
            .copied())
    }

    async fn voter_total(&self, voter_id: VoterId) -> Result<i64, AggregateStoreError> {
        Ok(self.lock().voters.get(&voter_id).copied().unwrap_or(0))
    }

    async fn seed_candidates(&self, ids: &[CandidateId]) -> Result<(), AggregateStoreError> {
        let mut state = self.lock();
        let global = state
            .collections
            .entry(AggregateCollection::Candidates)
            .or_default();
        for id in ids {
            global.entry(candidate_member(*id)).or_insert(0);
        }
        Ok(())
    }

    async fn replace_all(&self, snapshot: &AggregateSnapshot) -> Result<(), AggregateStoreError> {
        let mut next = State::default();
        for (collection, members) in &snapshot.collections {
            if members.is_empty() {
                continue;
            }
            next.collections.insert(
                collection.clone(),
                members
                    .iter()
                    .map(|scored| (scored.member.clone(), scored.score))
                    .collect(),
            );
        }
        next.voters = snapshot.voter_totals.iter().copied().collect();
        *self.lock() = next;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AggregateStoreError> {
        *self.lock() = State::default();
        Ok(())
    }
}
