//! End-to-end tallying behaviour over the in-process ledger and aggregate
//! store: quota enforcement, record upserts, leaderboard shape, reset, and
//! recovery when the aggregate store rejects a write while other ballots are
//! in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ::election::domain::ports::{
    AggregateCollection, AggregateSnapshot, AggregateStore, AggregateStoreError, ElectionAdmin,
    ElectionQuery, NoOpVoteMetrics, NoPageCache, ScoredMember, VoteCommand,
};
use ::election::domain::{
    Ballot, Candidate, CandidateId, CandidateRegistry, ElectionAdminService, ElectionError,
    ElectionQueryService, Sex, TOP_N, TallyGate, VoteRequest, VoteService, VoterCredentials,
    VoterId,
};
use ::election::outbound::aggregates::InMemoryAggregateStore;
use ::election::test_support::InMemoryVoteLedger;
use rstest::{fixture, rstest};
use tokio::sync::Notify;

/// Keyword whose ballots stall inside `apply_ballot`.
const STALLED_KEYWORD: &str = "slow";

/// Aggregate store that can be told to reject the next ballot, and that
/// stalls ballots carrying [`STALLED_KEYWORD`] after their ledger commit.
#[derive(Default)]
struct FlakyAggregateStore {
    inner: InMemoryAggregateStore,
    fail_next_ballot: AtomicBool,
    stalled: Notify,
}

impl FlakyAggregateStore {
    fn fail_next_ballot(&self) {
        self.fail_next_ballot.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AggregateStore for FlakyAggregateStore {
    async fn increment(
        &self,
        collection: &AggregateCollection,
        member: &str,
        delta: i64,
    ) -> Result<i64, AggregateStoreError> {
        self.inner.increment(collection, member, delta).await
    }

    async fn apply_ballot(&self, ballot: &Ballot) -> Result<(), AggregateStoreError> {
        if ballot.keyword == STALLED_KEYWORD {
            self.stalled.notify_one();
            tokio::time::sleep(Duration::from_millis(200)).await;
            return self.inner.apply_ballot(ballot).await;
        }
        if self.fail_next_ballot.swap(false, Ordering::SeqCst) {
            return Err(AggregateStoreError::backend("connection reset"));
        }
        self.inner.apply_ballot(ballot).await
    }

    async fn top_n(
        &self,
        collection: &AggregateCollection,
        n: usize,
    ) -> Result<Vec<ScoredMember>, AggregateStoreError> {
        self.inner.top_n(collection, n).await
    }

    async fn bottom(
        &self,
        collection: &AggregateCollection,
    ) -> Result<Option<ScoredMember>, AggregateStoreError> {
        self.inner.bottom(collection).await
    }

    async fn score_of(
        &self,
        collection: &AggregateCollection,
        member: &str,
    ) -> Result<Option<i64>, AggregateStoreError> {
        self.inner.score_of(collection, member).await
    }

    async fn voter_total(&self, voter_id: VoterId) -> Result<i64, AggregateStoreError> {
        self.inner.voter_total(voter_id).await
    }

    async fn seed_candidates(&self, ids: &[CandidateId]) -> Result<(), AggregateStoreError> {
        self.inner.seed_candidates(ids).await
    }

    async fn replace_all(&self, snapshot: &AggregateSnapshot) -> Result<(), AggregateStoreError> {
        self.inner.replace_all(snapshot).await
    }

    async fn clear(&self) -> Result<(), AggregateStoreError> {
        self.inner.clear().await
    }
}

struct Election {
    ledger: Arc<InMemoryVoteLedger>,
    aggregates: Arc<FlakyAggregateStore>,
    votes: Arc<VoteService<InMemoryVoteLedger, FlakyAggregateStore>>,
    results: ElectionQueryService<FlakyAggregateStore>,
    admin: ElectionAdminService<InMemoryVoteLedger, FlakyAggregateStore>,
}

const PARTIES: [&str; 3] = ["Blue", "Green", "Red"];

fn candidate(id: i32) -> Candidate {
    let party_index = usize::try_from(id).unwrap_or(0) % PARTIES.len();
    Candidate {
        id: CandidateId::new(id),
        name: format!("Candidate {id}"),
        political_party: PARTIES.get(party_index).copied().unwrap_or("Blue").to_owned(),
        sex: if id % 2 == 0 { Sex::Female } else { Sex::Male },
    }
}

#[fixture]
fn election() -> Election {
    let ledger = Arc::new(InMemoryVoteLedger::new());
    for id in 1..=15 {
        ledger.add_candidate(candidate(id));
    }
    ledger.add_voter("Taro", "Tokyo", "0001", 10);
    ledger.add_voter("Hanako", "Osaka", "0002", 100);

    let aggregates = Arc::new(FlakyAggregateStore::default());
    let registry = Arc::new(CandidateRegistry::new());
    let gate = Arc::new(TallyGate::new());
    Election {
        votes: Arc::new(VoteService::new(
            Arc::clone(&ledger),
            Arc::clone(&aggregates),
            Arc::clone(&registry),
            Arc::new(NoPageCache),
            Arc::new(NoOpVoteMetrics),
            Arc::clone(&gate),
        )),
        results: ElectionQueryService::new(Arc::clone(&aggregates), Arc::clone(&registry)),
        admin: ElectionAdminService::new(
            Arc::clone(&ledger),
            Arc::clone(&aggregates),
            registry,
            Arc::new(NoPageCache),
            gate,
        ),
        ledger,
        aggregates,
    }
}

fn taro(candidate: &str, keyword: &str, count: i64) -> VoteRequest {
    request("Taro", "Tokyo", "0001", candidate, keyword, count)
}

fn hanako(candidate: &str, keyword: &str, count: i64) -> VoteRequest {
    request("Hanako", "Osaka", "0002", candidate, keyword, count)
}

fn request(
    name: &str,
    address: &str,
    my_number: &str,
    candidate: &str,
    keyword: &str,
    count: i64,
) -> VoteRequest {
    VoteRequest {
        credentials: VoterCredentials {
            name: name.to_owned(),
            address: address.to_owned(),
            my_number: my_number.to_owned(),
        },
        candidate: candidate.to_owned(),
        keyword: keyword.to_owned(),
        count,
    }
}

async fn assert_tallies_agree(election: &Election) {
    let drift = election.admin.audit().await.expect("audit");
    assert!(drift.is_empty(), "tallies disagree: {drift:?}");
}

#[rstest]
#[tokio::test]
async fn quota_is_enforced_across_ballots(election: Election) {
    election.admin.reset().await.expect("reset");

    let receipt = election
        .votes
        .cast_vote(taro("Candidate 1", "jobs", 7))
        .await
        .expect("first ballot");
    assert_eq!(receipt.remaining, 3);

    let err = election
        .votes
        .cast_vote(taro("Candidate 1", "jobs", 4))
        .await
        .expect_err("over quota");
    assert_eq!(
        err,
        ElectionError::QuotaExceeded {
            requested: 4,
            remaining: 3
        }
    );

    let receipt = election
        .votes
        .cast_vote(taro("Candidate 2", "tax", 3))
        .await
        .expect("exact remainder");
    assert_eq!(receipt.remaining, 0);
    assert_eq!(election.ledger.voter_used(VoterId::new(1)), Some(10));
    assert_tallies_agree(&election).await;
}

#[rstest]
#[tokio::test]
async fn rejected_requests_write_nothing(election: Election) {
    election.admin.reset().await.expect("reset");

    let unknown = election
        .votes
        .cast_vote(taro("Nobody", "jobs", 1))
        .await
        .expect_err("unknown candidate");
    assert_eq!(unknown, ElectionError::unknown_candidate("Nobody"));

    let wrong_address = election
        .votes
        .cast_vote(request("Taro", "Kyoto", "0001", "Candidate 1", "jobs", 1))
        .await
        .expect_err("identity mismatch");
    assert_eq!(wrong_address, ElectionError::UserNotFound);

    assert_eq!(election.ledger.record_rows(), 0);
    assert_eq!(election.ledger.voter_used(VoterId::new(1)), Some(0));
    assert_eq!(
        election.ledger.candidate_counter(CandidateId::new(1)),
        Some(0)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_ballots_share_one_record(election: Election) {
    election.admin.reset().await.expect("reset");
    let handles: Vec<_> = (0..20)
        .map(|_| {
            let votes = Arc::clone(&election.votes);
            tokio::spawn(async move { votes.cast_vote(hanako("Candidate 3", "jobs", 2)).await })
        })
        .collect();
    for handle in handles {
        handle.await.expect("vote task").expect("vote accepted");
    }

    assert_eq!(election.ledger.record_rows(), 1);
    assert_eq!(
        election
            .ledger
            .record_count(VoterId::new(2), CandidateId::new(3), "jobs"),
        40
    );
    let detail = election
        .results
        .candidate_detail(CandidateId::new(3))
        .await
        .expect("detail");
    assert_eq!(detail.candidate.votes, 40);
    assert_eq!(
        detail.keywords.first().map(|k| (k.keyword.as_str(), k.votes)),
        Some(("jobs", 40))
    );
    assert_tallies_agree(&election).await;
}

#[rstest]
#[tokio::test]
async fn leaderboard_lists_top_ten_and_last_place(election: Election) {
    election.admin.reset().await.expect("reset");
    for id in 1..=12 {
        let name = format!("Candidate {id}");
        election
            .votes
            .cast_vote(hanako(&name, "jobs", i64::from(id)))
            .await
            .expect("ballot");
    }

    let first = election.results.leaderboard().await.expect("leaderboard");
    let second = election.results.leaderboard().await.expect("leaderboard");
    assert_eq!(first, second);
    assert_eq!(first.entries.len(), TOP_N + 1);

    let leaders: Vec<i64> = first.entries.iter().take(TOP_N).map(|e| e.votes).collect();
    assert_eq!(leaders, vec![12, 11, 10, 9, 8, 7, 6, 5, 4, 3]);
    // Candidates 13 to 15 were seeded at zero and share last place.
    assert_eq!(first.last_place().map(|e| e.votes), Some(0));
}

#[rstest]
#[tokio::test]
async fn reset_is_idempotent(election: Election) {
    election.admin.reset().await.expect("reset");
    election
        .votes
        .cast_vote(taro("Candidate 4", "jobs", 5))
        .await
        .expect("ballot");

    election.admin.reset().await.expect("first reset");
    election.admin.reset().await.expect("second reset");

    assert_eq!(election.ledger.record_rows(), 0);
    assert_eq!(election.ledger.voter_used(VoterId::new(1)), Some(0));
    let summary = election.results.summary().await.expect("summary");
    assert!(summary.leaderboard.entries.iter().all(|e| e.votes == 0));
    assert!(summary.parties.iter().all(|p| p.votes == 0));
    assert_eq!((summary.sex_ratio.men, summary.sex_ratio.women), (0, 0));
    assert_tallies_agree(&election).await;
}

#[rstest]
#[tokio::test]
async fn failed_aggregate_write_is_rebuilt_from_ledger(election: Election) {
    election.admin.reset().await.expect("reset");
    election
        .votes
        .cast_vote(hanako("Candidate 5", "jobs", 2))
        .await
        .expect("first ballot");

    election.aggregates.fail_next_ballot();
    let receipt = election
        .votes
        .cast_vote(hanako("Candidate 5", "tax", 3))
        .await
        .expect("ledger commit stands");

    assert!(receipt.aggregates_current);
    let detail = election
        .results
        .candidate_detail(CandidateId::new(5))
        .await
        .expect("detail");
    assert_eq!(detail.candidate.votes, 5);
    assert_tallies_agree(&election).await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recovery_waits_for_ballots_between_commit_and_aggregation(election: Election) {
    election.admin.reset().await.expect("reset");

    // The stalled ballot is committed to the ledger but not yet aggregated
    // when the failing ballot starts its rebuild.
    let stalled = {
        let votes = Arc::clone(&election.votes);
        tokio::spawn(async move {
            votes
                .cast_vote(hanako("Candidate 7", STALLED_KEYWORD, 3))
                .await
        })
    };
    election.aggregates.stalled.notified().await;

    election.aggregates.fail_next_ballot();
    let recovered = election
        .votes
        .cast_vote(hanako("Candidate 7", "fail", 2))
        .await
        .expect("ledger commit stands");
    let slow = stalled
        .await
        .expect("vote task")
        .expect("stalled ballot accepted");

    assert!(recovered.aggregates_current);
    assert!(slow.aggregates_current);
    let detail = election
        .results
        .candidate_detail(CandidateId::new(7))
        .await
        .expect("detail");
    assert_eq!(detail.candidate.votes, 5);
    let mut keywords: Vec<(&str, i64)> = detail
        .keywords
        .iter()
        .map(|k| (k.keyword.as_str(), k.votes))
        .collect();
    keywords.sort_unstable();
    assert_eq!(keywords, vec![("fail", 2), (STALLED_KEYWORD, 3)]);
    assert_tallies_agree(&election).await;
}

#[rstest]
#[tokio::test]
async fn party_results_sum_member_candidates(election: Election) {
    election.admin.reset().await.expect("reset");
    // Candidates 3 and 6 both belong to party "Blue".
    election
        .votes
        .cast_vote(hanako("Candidate 3", "jobs", 4))
        .await
        .expect("ballot");
    election
        .votes
        .cast_vote(hanako("Candidate 6", "tax", 6))
        .await
        .expect("ballot");

    let party = election
        .results
        .party_detail("Blue")
        .await
        .expect("party detail");
    assert_eq!(party.votes, 10);
    let keywords: Vec<(&str, i64)> = party
        .keywords
        .iter()
        .map(|k| (k.keyword.as_str(), k.votes))
        .collect();
    assert_eq!(keywords, vec![("tax", 6), ("jobs", 4)]);

    let missing = election
        .results
        .party_detail("Purple")
        .await
        .expect_err("unknown party");
    assert_eq!(missing, ElectionError::unknown_party("Purple"));
}
