//! Port for the derived aggregate store.
//!
//! Aggregates are sorted collections of `member -> score` pairs plus one
//! scalar counter per voter. They are never authoritative: every value can
//! be rebuilt from the ledger with [`AggregateSnapshot`].

use std::fmt;

use async_trait::async_trait;

use crate::domain::{Ballot, CandidateId, VoterId};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by aggregate store adapters.
    pub enum AggregateStoreError {
        /// Store backend is unavailable or timing out.
        Backend { message: String } => "aggregate store backend failure: {message}",
        /// A stored value could not be decoded.
        Decode { message: String } => "aggregate store returned malformed data: {message}",
    }
}

const CANDIDATE_MEMBER_PREFIX: &str = "candidate:";

/// Named sorted collection inside the aggregate store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AggregateCollection {
    /// Global ranking of candidates, members are [`candidate_member`] tokens.
    Candidates,
    /// Keyword scores for one candidate.
    CandidateKeywords(CandidateId),
    /// Keyword scores for one party.
    PartyKeywords(String),
}

impl fmt::Display for AggregateCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Candidates => write!(f, "candidates"),
            Self::CandidateKeywords(id) => write!(f, "candidate:{id}:keywords"),
            Self::PartyKeywords(party) => write!(f, "party:{party}:keywords"),
        }
    }
}

/// Member token used for a candidate inside [`AggregateCollection::Candidates`].
pub fn candidate_member(id: CandidateId) -> String {
    format!("{CANDIDATE_MEMBER_PREFIX}{id}")
}

/// Parse a member token produced by [`candidate_member`].
pub fn parse_candidate_member(member: &str) -> Option<CandidateId> {
    member
        .strip_prefix(CANDIDATE_MEMBER_PREFIX)
        .and_then(|raw| raw.parse::<i32>().ok())
        .map(CandidateId::new)
}

/// A member and its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredMember {
    pub member: String,
    pub score: i64,
}

impl ScoredMember {
    /// Build a scored member.
    pub fn new(member: impl Into<String>, score: i64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

/// Complete contents for every collection, derived from the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateSnapshot {
    pub collections: Vec<(AggregateCollection, Vec<ScoredMember>)>,
    pub voter_totals: Vec<(VoterId, i64)>,
}

/// Port for derived leaderboards and counters.
///
/// Increments are atomic per (collection, member). Reads never observe a
/// partially applied [`AggregateStore::apply_ballot`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Add `delta` to a member's score, creating it on first use.
    ///
    /// Returns the new score.
    async fn increment(
        &self,
        collection: &AggregateCollection,
        member: &str,
        delta: i64,
    ) -> Result<i64, AggregateStoreError>;

    /// Apply every increment a committed ballot implies as one unit: the
    /// candidate and party keyword scores, the global candidate score, and
    /// the voter's cumulative counter.
    async fn apply_ballot(&self, ballot: &Ballot) -> Result<(), AggregateStoreError>;

    /// Highest scoring members, descending. Tie order is unspecified.
    async fn top_n(
        &self,
        collection: &AggregateCollection,
        n: usize,
    ) -> Result<Vec<ScoredMember>, AggregateStoreError>;

    /// Lowest scoring member, if the collection is non-empty.
    async fn bottom(
        &self,
        collection: &AggregateCollection,
    ) -> Result<Option<ScoredMember>, AggregateStoreError>;

    /// Score of one member, `None` when absent.
    async fn score_of(
        &self,
        collection: &AggregateCollection,
        member: &str,
    ) -> Result<Option<i64>, AggregateStoreError>;

    /// Cumulative votes recorded for a voter.
    ///
    /// The per-voter counter is write-only for the services: `apply_ballot`
    /// and `replace_all` maintain it alongside the ledger's `voted_count`,
    /// but quota decisions always read the ledger. Only adapter and
    /// integration tests read it back.
    async fn voter_total(&self, voter_id: VoterId) -> Result<i64, AggregateStoreError>;

    /// Give every listed candidate a score of zero in the global ranking
    /// unless it already has one.
    async fn seed_candidates(&self, ids: &[CandidateId]) -> Result<(), AggregateStoreError>;

    /// Replace every collection and counter with the snapshot contents.
    async fn replace_all(&self, snapshot: &AggregateSnapshot) -> Result<(), AggregateStoreError>;

    /// Remove every collection and counter.
    async fn clear(&self) -> Result<(), AggregateStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn candidate_members_round_trip() {
        let member = candidate_member(CandidateId::new(42));
        assert_eq!(member, "candidate:42");
        assert_eq!(parse_candidate_member(&member), Some(CandidateId::new(42)));
    }

    #[rstest]
    #[case("42")]
    #[case("candidate:")]
    #[case("candidate:x")]
    #[case("party:42")]
    fn malformed_members_are_rejected(#[case] member: &str) {
        assert_eq!(parse_candidate_member(member), None);
    }

    #[rstest]
    #[case(AggregateCollection::Candidates, "candidates")]
    #[case(
        AggregateCollection::CandidateKeywords(CandidateId::new(7)),
        "candidate:7:keywords"
    )]
    #[case(
        AggregateCollection::PartyKeywords("Blue".to_owned()),
        "party:Blue:keywords"
    )]
    fn collections_render_stable_names(
        #[case] collection: AggregateCollection,
        #[case] expected: &str,
    ) {
        assert_eq!(collection.to_string(), expected);
    }
}
