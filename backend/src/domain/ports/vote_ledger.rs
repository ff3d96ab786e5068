//! Port for the durable vote ledger.
//!
//! The ledger is the source of truth for voters, candidates and vote
//! records. Every aggregate is derivable from what this port returns.

use async_trait::async_trait;

use crate::domain::{Ballot, Candidate, CandidateId, LedgerReceipt, Voter, VoterId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger adapters.
    pub enum LedgerError {
        /// Ledger connection could not be established.
        Connection { message: String } =>
            "ledger connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "ledger query failed: {message}",
        /// The guarded quota update matched no row; the transaction rolled back.
        QuotaExceeded { remaining: u32 } =>
            "voter quota exceeded: {remaining} votes remain",
    }
}

/// Summed votes for one (candidate, keyword) pair across all voters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTally {
    pub candidate_id: CandidateId,
    pub keyword: String,
    pub votes: i64,
}

/// Full re-derivation input read from the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerTally {
    /// Cumulative counter stored on each candidate row.
    pub candidate_totals: Vec<(CandidateId, i64)>,
    /// Vote records summed per (candidate, keyword).
    pub keyword_totals: Vec<KeywordTally>,
    /// Vote records summed per voter.
    pub voter_totals: Vec<(VoterId, i64)>,
}

impl LedgerTally {
    /// Sum of vote record counts for one candidate.
    pub fn record_total(&self, candidate_id: CandidateId) -> i64 {
        self.keyword_totals
            .iter()
            .filter(|tally| tally.candidate_id == candidate_id)
            .map(|tally| tally.votes)
            .sum()
    }

    /// Cumulative counter stored for one candidate, zero when absent.
    pub fn candidate_total(&self, candidate_id: CandidateId) -> i64 {
        self.candidate_totals
            .iter()
            .find(|(id, _)| *id == candidate_id)
            .map_or(0, |(_, votes)| *votes)
    }
}

/// Port for ledger reads and transactional vote writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteLedger: Send + Sync {
    /// Fetch the voter holding `my_number`, if any.
    async fn find_voter(&self, my_number: &str) -> Result<Option<Voter>, LedgerError>;

    /// Record a ballot in one transaction.
    ///
    /// The transaction increments the voter's `used` counter only while it
    /// stays within quota, upserts the vote record for the ballot's triple
    /// (adding `count` when it already exists), and increments the
    /// candidate's cumulative counter. Any failure rolls everything back.
    async fn record_ballot(&self, ballot: &Ballot) -> Result<LedgerReceipt, LedgerError>;

    /// Load every candidate.
    async fn list_candidates(&self) -> Result<Vec<Candidate>, LedgerError>;

    /// Delete all vote records and zero every voter and candidate counter.
    async fn reset_votes(&self) -> Result<(), LedgerError>;

    /// Read the totals needed to rebuild every aggregate.
    async fn tally(&self) -> Result<LedgerTally, LedgerError>;
}
