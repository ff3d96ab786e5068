//! Vote requests and the validated ballots written to the stores.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CandidateId, ElectionError, VoterCredentials, VoterId};

/// Longest keyword the ledger's `votes.keyword` column holds, in characters.
pub const MAX_KEYWORD_CHARS: usize = 255;

/// Raw vote request as decoded by an inbound adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRequest {
    pub credentials: VoterCredentials,
    /// Candidate display name or numeric id.
    pub candidate: String,
    /// Free-text reason attached to the votes.
    pub keyword: String,
    pub count: i64,
}

impl VoteRequest {
    /// Check the request shape before any store is consulted.
    ///
    /// Returns the vote count as an unsigned value on success.
    pub fn validate_shape(&self) -> Result<u32, ElectionError> {
        if self.candidate.trim().is_empty() {
            return Err(ElectionError::MissingCandidate);
        }
        let keyword = self.keyword.trim();
        if keyword.is_empty() {
            return Err(ElectionError::MissingKeyword);
        }
        if keyword.chars().count() > MAX_KEYWORD_CHARS {
            return Err(ElectionError::KeywordTooLong {
                max: MAX_KEYWORD_CHARS,
            });
        }
        u32::try_from(self.count)
            .ok()
            .filter(|count| *count >= 1)
            .ok_or(ElectionError::InvalidVoteCount { count: self.count })
    }
}

/// One validated unit of votes for a (voter, candidate, keyword) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub voter_id: VoterId,
    pub candidate_id: CandidateId,
    /// Party of the candidate, used to scope the party keyword collection.
    pub political_party: String,
    pub keyword: String,
    pub count: u32,
}

/// Ledger state after a ballot commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerReceipt {
    /// Voter's `used` counter after the commit.
    pub voter_used: u32,
    /// Candidate's cumulative counter after the commit.
    pub candidate_total: i64,
}

/// Outcome of a successful vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    #[schema(value_type = i32)]
    pub candidate_id: CandidateId,
    pub count: u32,
    pub remaining: u32,
    /// False when the aggregate store could not be brought up to date; the
    /// vote is recorded in the ledger regardless.
    pub aggregates_current: bool,
}
