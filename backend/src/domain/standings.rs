//! Read models returned by result queries.

use serde::Serialize;
use utoipa::ToSchema;

use super::{Candidate, CandidateId, Sex};

/// Number of ranked entries shown on leaderboards and keyword lists.
pub const TOP_N: usize = 10;

/// A candidate together with their cumulative score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStanding {
    #[schema(value_type = i32)]
    pub id: CandidateId,
    pub name: String,
    pub political_party: String,
    pub sex: Sex,
    pub votes: i64,
}

impl CandidateStanding {
    /// Pair candidate metadata with a score.
    pub fn new(candidate: &Candidate, votes: i64) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name.clone(),
            political_party: candidate.political_party.clone(),
            sex: candidate.sex,
            votes,
        }
    }
}

/// Global ranking: the top candidates followed by last place.
///
/// When there are fewer than `TOP_N + 1` ranked candidates, last place also
/// appears among the leaders. The duplicate is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub entries: Vec<CandidateStanding>,
}

impl Leaderboard {
    /// The appended last-place entry, if any candidate is ranked.
    pub fn last_place(&self) -> Option<&CandidateStanding> {
        self.entries.last()
    }
}

/// Keyword and the number of votes cast with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct KeywordScore {
    pub keyword: String,
    pub votes: i64,
}

/// Candidate detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetail {
    pub candidate: CandidateStanding,
    pub keywords: Vec<KeywordScore>,
}

/// Party detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartyDetail {
    pub political_party: String,
    pub votes: i64,
    pub keywords: Vec<KeywordScore>,
    pub candidates: Vec<CandidateStanding>,
}

/// Party and the sum of its candidates' scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartyStanding {
    pub political_party: String,
    pub votes: i64,
}

/// Votes split by candidate sex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SexRatio {
    pub men: i64,
    pub women: i64,
}

impl SexRatio {
    /// Add a candidate's score to the matching bucket.
    pub fn add(&mut self, sex: Sex, votes: i64) {
        match sex {
            Sex::Male => self.men += votes,
            Sex::Female => self.women += votes,
        }
    }
}

/// Everything the results page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSummary {
    pub leaderboard: Leaderboard,
    pub parties: Vec<PartyStanding>,
    pub sex_ratio: SexRatio,
}

/// Candidate whose three tallies disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TallyDrift {
    #[schema(value_type = i32)]
    pub candidate_id: CandidateId,
    /// Sum of the candidate's vote records.
    pub record_votes: i64,
    /// Cumulative counter on the candidate row.
    pub counter_votes: i64,
    /// Score in the global aggregate ranking.
    pub aggregate_votes: i64,
}

impl TallyDrift {
    /// Whether the three tallies agree.
    pub fn is_consistent(&self) -> bool {
        self.record_votes == self.counter_votes && self.counter_votes == self.aggregate_votes
    }
}
