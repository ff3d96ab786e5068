//! Test doubles shared by unit tests and the integration suites under
//! `tests/`. Compiled for tests or with the `test-support` feature.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{KeywordTally, LedgerError, LedgerTally, VoteLedger};
use crate::domain::{Ballot, Candidate, CandidateId, LedgerReceipt, Voter, VoterId};

#[derive(Debug, Default)]
struct LedgerState {
    voters: BTreeMap<VoterId, Voter>,
    candidates: BTreeMap<CandidateId, (Candidate, i64)>,
    records: HashMap<(VoterId, CandidateId, String), i64>,
    offline: bool,
}

/// Mutex-guarded [`VoteLedger`] with the same transactional semantics as
/// the PostgreSQL adapter: a ballot either applies all three writes or none.
///
/// # Examples
///
/// ```
/// use election::domain::{Candidate, CandidateId, Sex};
/// use election::test_support::InMemoryVoteLedger;
///
/// let ledger = InMemoryVoteLedger::new();
/// ledger.add_candidate(Candidate {
///     id: CandidateId::new(1),
///     name: "Abe".to_owned(),
///     political_party: "Blue".to_owned(),
///     sex: Sex::Male,
/// });
/// let voter = ledger.add_voter("Taro", "Tokyo", "0001", 10);
/// assert_eq!(ledger.voter_used(voter), Some(0));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVoteLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryVoteLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a voter with `quota` votes and return their id.
    pub fn add_voter(&self, name: &str, address: &str, my_number: &str, quota: u32) -> VoterId {
        let mut state = self.lock();
        let next = state
            .voters
            .keys()
            .next_back()
            .map_or(1, |id| id.get() + 1);
        let id = VoterId::new(next);
        state.voters.insert(
            id,
            Voter {
                id,
                name: name.to_owned(),
                address: address.to_owned(),
                my_number: my_number.to_owned(),
                quota,
                used: 0,
            },
        );
        id
    }

    /// Register a candidate with a zero counter.
    pub fn add_candidate(&self, candidate: Candidate) {
        self.lock()
            .candidates
            .insert(candidate.id, (candidate, 0));
    }

    /// Make every subsequent call fail with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Votes a voter has used, if registered.
    pub fn voter_used(&self, id: VoterId) -> Option<u32> {
        self.lock().voters.get(&id).map(|voter| voter.used)
    }

    /// Cumulative counter on a candidate, if registered.
    pub fn candidate_counter(&self, id: CandidateId) -> Option<i64> {
        self.lock().candidates.get(&id).map(|(_, total)| *total)
    }

    /// Count stored on the record for one (voter, candidate, keyword) triple.
    pub fn record_count(&self, voter: VoterId, candidate: CandidateId, keyword: &str) -> i64 {
        self.lock()
            .records
            .get(&(voter, candidate, keyword.to_owned()))
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct vote records.
    pub fn record_rows(&self) -> usize {
        self.lock().records.len()
    }
}

fn offline_error() -> LedgerError {
    LedgerError::connection("in-memory ledger offline")
}

#[async_trait]
impl VoteLedger for InMemoryVoteLedger {
    async fn find_voter(&self, my_number: &str) -> Result<Option<Voter>, LedgerError> {
        let state = self.lock();
        if state.offline {
            return Err(offline_error());
        }
        Ok(state
            .voters
            .values()
            .find(|voter| voter.my_number == my_number)
            .cloned())
    }

    async fn record_ballot(&self, ballot: &Ballot) -> Result<LedgerReceipt, LedgerError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.offline {
            return Err(offline_error());
        }
        let voter = state
            .voters
            .get_mut(&ballot.voter_id)
            .ok_or_else(|| LedgerError::query(format!("voter {} missing", ballot.voter_id)))?;
        let (_, candidate_total) = state
            .candidates
            .get_mut(&ballot.candidate_id)
            .ok_or_else(|| {
                LedgerError::query(format!("candidate {} missing", ballot.candidate_id))
            })?;
        if !voter.can_cast(ballot.count) {
            return Err(LedgerError::quota_exceeded(voter.remaining()));
        }

        voter.used += ballot.count;
        *candidate_total += i64::from(ballot.count);
        *state
            .records
            .entry((ballot.voter_id, ballot.candidate_id, ballot.keyword.clone()))
            .or_default() += i64::from(ballot.count);

        Ok(LedgerReceipt {
            voter_used: voter.used,
            candidate_total: *candidate_total,
        })
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, LedgerError> {
        let state = self.lock();
        if state.offline {
            return Err(offline_error());
        }
        Ok(state
            .candidates
            .values()
            .map(|(candidate, _)| candidate.clone())
            .collect())
    }

    async fn reset_votes(&self) -> Result<(), LedgerError> {
        let mut state = self.lock();
        if state.offline {
            return Err(offline_error());
        }
        state.records.clear();
        for voter in state.voters.values_mut() {
            voter.used = 0;
        }
        for (_, total) in state.candidates.values_mut() {
            *total = 0;
        }
        Ok(())
    }

    async fn tally(&self) -> Result<LedgerTally, LedgerError> {
        let state = self.lock();
        if state.offline {
            return Err(offline_error());
        }

        let mut keyword_totals: BTreeMap<(CandidateId, String), i64> = BTreeMap::new();
        let mut voter_totals: BTreeMap<VoterId, i64> = BTreeMap::new();
        for ((voter, candidate, keyword), count) in &state.records {
            *keyword_totals
                .entry((*candidate, keyword.clone()))
                .or_default() += count;
            *voter_totals.entry(*voter).or_default() += count;
        }

        Ok(LedgerTally {
            candidate_totals: state
                .candidates
                .iter()
                .map(|(id, (_, total))| (*id, *total))
                .collect(),
            keyword_totals: keyword_totals
                .into_iter()
                .map(|((candidate_id, keyword), votes)| KeywordTally {
                    candidate_id,
                    keyword,
                    votes,
                })
                .collect(),
            voter_totals: voter_totals.into_iter().collect(),
        })
    }
}
