//! Tests for the vote casting service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{
    AggregateStoreError, LedgerTally, MockAggregateStore, MockPageCache, MockVoteLedger,
    MockVoteMetrics,
};
use crate::domain::{
    Candidate, CandidateDirectory, CandidateId, LedgerReceipt, MAX_KEYWORD_CHARS, Sex, TallyGate,
    Voter, VoterCredentials, VoterId,
};
use rstest::rstest;

fn registry() -> Arc<CandidateRegistry> {
    Arc::new(CandidateRegistry::with_directory(CandidateDirectory::new(
        vec![
            Candidate {
                id: CandidateId::new(1),
                name: "Abe".to_owned(),
                political_party: "Blue".to_owned(),
                sex: Sex::Male,
            },
            Candidate {
                id: CandidateId::new(2),
                name: "Ito".to_owned(),
                political_party: "Green".to_owned(),
                sex: Sex::Female,
            },
        ],
    )))
}

fn voter(quota: u32, used: u32) -> Voter {
    Voter {
        id: VoterId::new(10),
        name: "Hanako".to_owned(),
        address: "Tokyo".to_owned(),
        my_number: "123456".to_owned(),
        quota,
        used,
    }
}

fn request(candidate: &str, count: i64) -> VoteRequest {
    VoteRequest {
        credentials: VoterCredentials {
            name: "Hanako".to_owned(),
            address: "Tokyo".to_owned(),
            my_number: "123456".to_owned(),
        },
        candidate: candidate.to_owned(),
        keyword: "jobs".to_owned(),
        count,
    }
}

fn expect_outcome(outcome: VoteOutcome, votes: u32) -> MockVoteMetrics {
    let mut metrics = MockVoteMetrics::new();
    metrics
        .expect_record()
        .withf(move |recorded, recorded_votes| *recorded == outcome && *recorded_votes == votes)
        .times(1)
        .returning(|_, _| Ok(()));
    metrics
}

fn flushing_cache(times: usize) -> MockPageCache {
    let mut cache = MockPageCache::new();
    cache.expect_flush().times(times).return_const(());
    cache
}

fn make_service(
    ledger: MockVoteLedger,
    aggregates: MockAggregateStore,
    cache: MockPageCache,
    metrics: MockVoteMetrics,
) -> VoteService<MockVoteLedger, MockAggregateStore> {
    VoteService::new(
        Arc::new(ledger),
        Arc::new(aggregates),
        registry(),
        Arc::new(cache),
        Arc::new(metrics),
        Arc::new(TallyGate::new()),
    )
}

fn ledger_with_voter(existing: Voter) -> MockVoteLedger {
    let mut ledger = MockVoteLedger::new();
    ledger
        .expect_find_voter()
        .withf(|my_number| my_number == "123456")
        .times(1)
        .return_once(move |_| Ok(Some(existing)));
    ledger
}

#[tokio::test]
async fn records_ballot_then_updates_aggregates() {
    let mut ledger = ledger_with_voter(voter(5, 1));
    ledger
        .expect_record_ballot()
        .withf(|ballot| {
            ballot.voter_id == VoterId::new(10)
                && ballot.candidate_id == CandidateId::new(1)
                && ballot.political_party == "Blue"
                && ballot.keyword == "jobs"
                && ballot.count == 2
        })
        .times(1)
        .return_once(|_| {
            Ok(LedgerReceipt {
                voter_used: 3,
                candidate_total: 2,
            })
        });
    let mut aggregates = MockAggregateStore::new();
    aggregates
        .expect_apply_ballot()
        .times(1)
        .return_once(|_| Ok(()));

    let service = make_service(
        ledger,
        aggregates,
        flushing_cache(1),
        expect_outcome(VoteOutcome::Accepted, 2),
    );

    let receipt = service
        .cast_vote(request("Abe", 2))
        .await
        .expect("vote succeeds");
    assert_eq!(
        receipt,
        VoteReceipt {
            candidate_id: CandidateId::new(1),
            count: 2,
            remaining: 2,
            aggregates_current: true,
        }
    );
}

#[tokio::test]
async fn resolves_candidates_by_numeric_id() {
    let mut ledger = ledger_with_voter(voter(5, 0));
    ledger
        .expect_record_ballot()
        .withf(|ballot| ballot.candidate_id == CandidateId::new(2))
        .times(1)
        .return_once(|_| {
            Ok(LedgerReceipt {
                voter_used: 1,
                candidate_total: 1,
            })
        });
    let mut aggregates = MockAggregateStore::new();
    aggregates
        .expect_apply_ballot()
        .times(1)
        .return_once(|_| Ok(()));

    let service = make_service(
        ledger,
        aggregates,
        flushing_cache(1),
        expect_outcome(VoteOutcome::Accepted, 1),
    );

    let receipt = service
        .cast_vote(request("2", 1))
        .await
        .expect("vote succeeds");
    assert_eq!(receipt.candidate_id, CandidateId::new(2));
}

#[rstest]
#[case(request("", 1), ElectionError::MissingCandidate, 1)]
#[case(request("Abe", 0), ElectionError::InvalidVoteCount { count: 0 }, 0)]
#[case(request("Nobody", 1), ElectionError::unknown_candidate("Nobody"), 1)]
#[case(
    VoteRequest { keyword: "k".repeat(MAX_KEYWORD_CHARS + 1), ..request("Abe", 2) },
    ElectionError::KeywordTooLong { max: MAX_KEYWORD_CHARS },
    2
)]
#[tokio::test]
async fn rejects_requests_without_touching_stores(
    #[case] req: VoteRequest,
    #[case] expected: ElectionError,
    #[case] votes: u32,
) {
    let service = make_service(
        MockVoteLedger::new(),
        MockAggregateStore::new(),
        flushing_cache(0),
        expect_outcome(VoteOutcome::Rejected, votes),
    );

    let error = service.cast_vote(req).await.expect_err("rejected");
    assert_eq!(error, expected);
}

#[rstest]
#[case("Taro", "Tokyo")]
#[case("Hanako", "Osaka")]
#[tokio::test]
async fn credential_mismatch_is_user_not_found(#[case] name: &str, #[case] address: &str) {
    let mut ledger = ledger_with_voter(voter(5, 0));
    ledger.expect_record_ballot().times(0);

    let service = make_service(
        ledger,
        MockAggregateStore::new(),
        flushing_cache(0),
        expect_outcome(VoteOutcome::Rejected, 1),
    );

    let mut req = request("Abe", 1);
    req.credentials.name = name.to_owned();
    req.credentials.address = address.to_owned();
    let error = service.cast_vote(req).await.expect_err("identity mismatch");
    assert_eq!(error, ElectionError::UserNotFound);
}

#[tokio::test]
async fn unknown_my_number_is_user_not_found() {
    let mut ledger = MockVoteLedger::new();
    ledger
        .expect_find_voter()
        .times(1)
        .return_once(|_| Ok(None));

    let service = make_service(
        ledger,
        MockAggregateStore::new(),
        flushing_cache(0),
        expect_outcome(VoteOutcome::Rejected, 1),
    );

    let error = service
        .cast_vote(request("Abe", 1))
        .await
        .expect_err("unknown voter");
    assert_eq!(error, ElectionError::UserNotFound);
}

#[tokio::test]
async fn quota_is_checked_before_writing() {
    let mut ledger = ledger_with_voter(voter(5, 3));
    ledger.expect_record_ballot().times(0);

    let service = make_service(
        ledger,
        MockAggregateStore::new(),
        flushing_cache(0),
        expect_outcome(VoteOutcome::Rejected, 3),
    );

    let error = service
        .cast_vote(request("Abe", 3))
        .await
        .expect_err("over quota");
    assert_eq!(
        error,
        ElectionError::QuotaExceeded {
            requested: 3,
            remaining: 2,
        }
    );
}

#[tokio::test]
async fn ledger_quota_guard_surfaces_as_quota_exceeded() {
    let mut ledger = ledger_with_voter(voter(5, 3));
    ledger
        .expect_record_ballot()
        .times(1)
        .return_once(|_| Err(LedgerError::quota_exceeded(0_u32)));
    let mut aggregates = MockAggregateStore::new();
    aggregates.expect_apply_ballot().times(0);

    let service = make_service(
        ledger,
        aggregates,
        flushing_cache(0),
        expect_outcome(VoteOutcome::Rejected, 2),
    );

    let error = service
        .cast_vote(request("Abe", 2))
        .await
        .expect_err("lost the race");
    assert_eq!(
        error,
        ElectionError::QuotaExceeded {
            requested: 2,
            remaining: 0,
        }
    );
}

#[tokio::test]
async fn ledger_failure_leaves_aggregates_untouched() {
    let mut ledger = ledger_with_voter(voter(5, 0));
    ledger
        .expect_record_ballot()
        .times(1)
        .return_once(|_| Err(LedgerError::connection("reset by peer")));
    let mut aggregates = MockAggregateStore::new();
    aggregates.expect_apply_ballot().times(0);

    let service = make_service(
        ledger,
        aggregates,
        flushing_cache(0),
        expect_outcome(VoteOutcome::Failed, 1),
    );

    let error = service
        .cast_vote(request("Abe", 1))
        .await
        .expect_err("ledger down");
    assert!(matches!(error, ElectionError::StoreUnavailable { .. }));
}

#[tokio::test]
async fn aggregate_failure_triggers_rebuild_from_ledger() {
    let mut ledger = ledger_with_voter(voter(5, 0));
    ledger.expect_record_ballot().times(1).return_once(|_| {
        Ok(LedgerReceipt {
            voter_used: 1,
            candidate_total: 1,
        })
    });
    ledger
        .expect_tally()
        .times(1)
        .return_once(|| Ok(LedgerTally::default()));
    let mut aggregates = MockAggregateStore::new();
    aggregates
        .expect_apply_ballot()
        .times(1)
        .return_once(|_| Err(AggregateStoreError::backend("timeout")));
    aggregates
        .expect_replace_all()
        .times(1)
        .return_once(|_| Ok(()));

    let service = make_service(
        ledger,
        aggregates,
        flushing_cache(1),
        expect_outcome(VoteOutcome::Accepted, 1),
    );

    let receipt = service
        .cast_vote(request("Abe", 1))
        .await
        .expect("vote is committed");
    assert!(receipt.aggregates_current);
}

#[tokio::test]
async fn failed_rebuild_still_reports_committed_vote() {
    let mut ledger = ledger_with_voter(voter(5, 0));
    ledger.expect_record_ballot().times(1).return_once(|_| {
        Ok(LedgerReceipt {
            voter_used: 1,
            candidate_total: 1,
        })
    });
    ledger
        .expect_tally()
        .times(1)
        .return_once(|| Ok(LedgerTally::default()));
    let mut aggregates = MockAggregateStore::new();
    aggregates
        .expect_apply_ballot()
        .times(1)
        .return_once(|_| Err(AggregateStoreError::backend("timeout")));
    aggregates
        .expect_replace_all()
        .times(1)
        .return_once(|_| Err(AggregateStoreError::backend("still down")));

    let service = make_service(
        ledger,
        aggregates,
        flushing_cache(1),
        expect_outcome(VoteOutcome::Accepted, 1),
    );

    let receipt = service
        .cast_vote(request("Abe", 1))
        .await
        .expect("vote is committed");
    assert!(!receipt.aggregates_current);
    assert_eq!(receipt.remaining, 4);
}
