//! Driving port for result reads.

use async_trait::async_trait;

use crate::domain::{
    CandidateDetail, CandidateId, ElectionError, ElectionSummary, Leaderboard, PartyDetail,
    SexRatio,
};

/// Use-case port answering result queries from the aggregate store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ElectionQuery: Send + Sync {
    /// Top candidates by global score with last place appended.
    async fn leaderboard(&self) -> Result<Leaderboard, ElectionError>;

    /// Candidate metadata, score, and top keywords.
    async fn candidate_detail(&self, id: CandidateId) -> Result<CandidateDetail, ElectionError>;

    /// Party total, top keywords, and member candidates.
    async fn party_detail(&self, party: &str) -> Result<PartyDetail, ElectionError>;

    /// Votes by candidate sex over the candidates shown on the leaderboard.
    async fn demographics(&self) -> Result<SexRatio, ElectionError>;

    /// Leaderboard, party standings, and demographic split in one read.
    async fn summary(&self) -> Result<ElectionSummary, ElectionError>;
}
