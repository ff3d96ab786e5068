//! Result query domain service.
//!
//! Every read is served from the aggregate store and decorated with
//! candidate metadata from the current directory snapshot.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::admin_service::map_aggregate_read_error;
use crate::domain::ports::{
    AggregateCollection, AggregateStore, ElectionQuery, ScoredMember, candidate_member,
    parse_candidate_member,
};
use crate::domain::{
    CandidateDetail, CandidateDirectory, CandidateId, CandidateRegistry, CandidateStanding,
    ElectionError, ElectionSummary, KeywordScore, Leaderboard, PartyDetail, PartyStanding,
    SexRatio, TOP_N,
};

/// Service implementing [`ElectionQuery`].
#[derive(Clone)]
pub struct ElectionQueryService<A> {
    aggregates: Arc<A>,
    registry: Arc<CandidateRegistry>,
}

impl<A> ElectionQueryService<A> {
    /// Create a new service over the aggregate store.
    pub fn new(aggregates: Arc<A>, registry: Arc<CandidateRegistry>) -> Self {
        Self {
            aggregates,
            registry,
        }
    }
}

fn standing(
    directory: &CandidateDirectory,
    scored: &ScoredMember,
) -> Result<CandidateStanding, ElectionError> {
    parse_candidate_member(&scored.member)
        .and_then(|id| directory.by_id(id))
        .map(|candidate| CandidateStanding::new(candidate, scored.score))
        .ok_or_else(|| {
            ElectionError::query_failed(format!(
                "ranking references unknown candidate member {}",
                scored.member
            ))
        })
}

fn keyword_scores(members: Vec<ScoredMember>) -> Vec<KeywordScore> {
    members
        .into_iter()
        .map(|scored| KeywordScore {
            keyword: scored.member,
            votes: scored.score,
        })
        .collect()
}

/// Sex split over the distinct candidates shown on a leaderboard.
/// Votes per sex across the leaderboard, counting a candidate shown both
/// in the top entries and as last place once.
fn sex_ratio(leaderboard: &Leaderboard) -> SexRatio {
    let mut seen = HashSet::new();
    let mut ratio = SexRatio::default();
    for entry in &leaderboard.entries {
        if seen.insert(entry.id) {
            ratio.add(entry.sex, entry.votes);
        }
    }
    ratio
}

impl<A> ElectionQueryService<A>
where
    A: AggregateStore,
{
    async fn candidate_score(&self, id: CandidateId) -> Result<i64, ElectionError> {
        let score = self
            .aggregates
            .score_of(&AggregateCollection::Candidates, &candidate_member(id))
            .await
            .map_err(map_aggregate_read_error)?;
        Ok(score.unwrap_or(0))
    }

    async fn top_keywords(
        &self,
        collection: AggregateCollection,
    ) -> Result<Vec<KeywordScore>, ElectionError> {
        let members = self
            .aggregates
            .top_n(&collection, TOP_N)
            .await
            .map_err(map_aggregate_read_error)?;
        Ok(keyword_scores(members))
    }

    async fn build_leaderboard(
        &self,
        directory: &CandidateDirectory,
    ) -> Result<Leaderboard, ElectionError> {
        let leaders = self
            .aggregates
            .top_n(&AggregateCollection::Candidates, TOP_N)
            .await
            .map_err(map_aggregate_read_error)?;
        let last = self
            .aggregates
            .bottom(&AggregateCollection::Candidates)
            .await
            .map_err(map_aggregate_read_error)?;

        let entries = leaders
            .iter()
            .chain(last.iter())
            .map(|scored| standing(directory, scored))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Leaderboard { entries })
    }

    async fn party_standings(
        &self,
        directory: &CandidateDirectory,
    ) -> Result<Vec<PartyStanding>, ElectionError> {
        let ranking = self
            .aggregates
            .top_n(&AggregateCollection::Candidates, directory.len())
            .await
            .map_err(map_aggregate_read_error)?;

        let mut totals: BTreeMap<&str, i64> =
            directory.parties().map(|party| (party, 0)).collect();
        for scored in &ranking {
            let Some(candidate) = parse_candidate_member(&scored.member)
                .and_then(|id| directory.by_id(id))
            else {
                continue;
            };
            *totals
                .entry(candidate.political_party.as_str())
                .or_default() += scored.score;
        }

        let mut standings: Vec<PartyStanding> = totals
            .into_iter()
            .map(|(party, votes)| PartyStanding {
                political_party: party.to_owned(),
                votes,
            })
            .collect();
        standings.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then_with(|| a.political_party.cmp(&b.political_party))
        });
        Ok(standings)
    }
}

#[async_trait]
impl<A> ElectionQuery for ElectionQueryService<A>
where
    A: AggregateStore,
{
    async fn leaderboard(&self) -> Result<Leaderboard, ElectionError> {
        let directory = self.registry.snapshot();
        self.build_leaderboard(&directory).await
    }

    async fn candidate_detail(&self, id: CandidateId) -> Result<CandidateDetail, ElectionError> {
        let directory = self.registry.snapshot();
        let candidate = directory
            .by_id(id)
            .ok_or_else(|| ElectionError::unknown_candidate(id.to_string()))?;

        let votes = self.candidate_score(id).await?;
        let keywords = self
            .top_keywords(AggregateCollection::CandidateKeywords(id))
            .await?;

        Ok(CandidateDetail {
            candidate: CandidateStanding::new(candidate, votes),
            keywords,
        })
    }

    async fn party_detail(&self, party: &str) -> Result<PartyDetail, ElectionError> {
        let directory = self.registry.snapshot();
        let members = directory.by_party(party);
        if members.is_empty() {
            return Err(ElectionError::unknown_party(party));
        }

        let mut candidates = Vec::with_capacity(members.len());
        for candidate in members {
            let votes = self.candidate_score(candidate.id).await?;
            candidates.push(CandidateStanding::new(candidate, votes));
        }
        let votes = candidates.iter().map(|standing| standing.votes).sum();
        let keywords = self
            .top_keywords(AggregateCollection::PartyKeywords(party.to_owned()))
            .await?;

        Ok(PartyDetail {
            political_party: party.to_owned(),
            votes,
            keywords,
            candidates,
        })
    }

    async fn demographics(&self) -> Result<SexRatio, ElectionError> {
        let leaderboard = self.leaderboard().await?;
        Ok(sex_ratio(&leaderboard))
    }

    async fn summary(&self) -> Result<ElectionSummary, ElectionError> {
        let directory = self.registry.snapshot();
        let leaderboard = self.build_leaderboard(&directory).await?;
        let parties = self.party_standings(&directory).await?;
        let ratio = sex_ratio(&leaderboard);
        Ok(ElectionSummary {
            leaderboard,
            parties,
            sex_ratio: ratio,
        })
    }
}

#[cfg(test)]
#[path = "query_service_tests.rs"]
mod tests;
