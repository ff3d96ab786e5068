//! PostgreSQL-backed `VoteLedger` implementation using Diesel ORM.
//!
//! Ballots are written in one transaction: a guarded quota update on the
//! voter row, an upsert of the vote record for the ballot's triple, and an
//! increment of the candidate counter. The guard makes the quota check and
//! the write a single statement, so concurrent ballots for one voter cannot
//! overshoot the quota.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{KeywordTally, LedgerError, LedgerTally, VoteLedger};
use crate::domain::{
    Ballot, Candidate, CandidateId, LedgerReceipt, Sex, Voter, VoterId,
};

use super::models::{CandidateRow, NewVoteRow, VoterRow};
use super::pool::{DbPool, PoolError};
use super::schema::{candidates, users, votes};

/// Diesel-backed implementation of the `VoteLedger` port.
#[derive(Clone)]
pub struct DieselVoteLedger {
    pool: DbPool,
}

impl DieselVoteLedger {
    /// Create a new ledger with the given connection pool.
    ///
    /// # Examples
    /// ```ignore
    /// use election::outbound::persistence::{DbPool, DieselVoteLedger, PoolConfig};
    ///
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/election")).await?;
    /// let ledger = DieselVoteLedger::new(pool);
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside the ballot transaction.
#[derive(Debug)]
enum BallotTxError {
    Diesel(diesel::result::Error),
    QuotaExceeded { remaining: u32 },
    VoterMissing,
}

impl From<diesel::result::Error> for BallotTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> LedgerError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            LedgerError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> LedgerError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => LedgerError::query("record not found"),
        DieselError::QueryBuilderError(_) => LedgerError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            LedgerError::connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            LedgerError::query("transaction serialization failure")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            LedgerError::query("vote references a missing voter or candidate")
        }
        DieselError::DatabaseError(_, _) => LedgerError::query("database error"),
        _ => LedgerError::query("database error"),
    }
}

fn map_tx_error(error: BallotTxError) -> LedgerError {
    match error {
        BallotTxError::Diesel(err) => map_diesel_error(err),
        BallotTxError::QuotaExceeded { remaining } => LedgerError::quota_exceeded(remaining),
        BallotTxError::VoterMissing => LedgerError::query("voter not found"),
    }
}

fn to_count(column: &'static str, value: i32) -> Result<u32, LedgerError> {
    u32::try_from(value)
        .map_err(|_| LedgerError::query(format!("negative {column} stored in ledger: {value}")))
}

fn row_to_voter(row: VoterRow) -> Result<Voter, LedgerError> {
    Ok(Voter {
        id: VoterId::new(row.id),
        name: row.name,
        address: row.address,
        my_number: row.mynumber,
        quota: to_count("users.votes", row.votes)?,
        used: to_count("users.voted_count", row.voted_count)?,
    })
}

fn row_to_candidate(row: CandidateRow) -> Result<Candidate, LedgerError> {
    let sex = row
        .sex
        .parse::<Sex>()
        .map_err(|err| LedgerError::query(format!("candidate {}: {err}", row.id)))?;
    Ok(Candidate {
        id: CandidateId::new(row.id),
        name: row.name,
        political_party: row.political_party,
        sex,
    })
}

#[async_trait]
impl VoteLedger for DieselVoteLedger {
    async fn find_voter(&self, my_number: &str) -> Result<Option<Voter>, LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<VoterRow> = users::table
            .filter(users::mynumber.eq(my_number))
            .select(VoterRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_voter).transpose()
    }

    async fn record_ballot(&self, ballot: &Ballot) -> Result<LedgerReceipt, LedgerError> {
        let count = i32::try_from(ballot.count)
            .map_err(|_| LedgerError::query("vote count exceeds ledger range"))?;
        let voter_id = ballot.voter_id.get();
        let candidate_id = ballot.candidate_id.get();
        let keyword = ballot.keyword.as_str();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let (voter_used, candidate_total) = conn
            .transaction::<_, BallotTxError, _>(|conn| {
                async move {
                    let voter_used: Option<i32> = diesel::update(
                        users::table
                            .filter(users::id.eq(voter_id))
                            .filter((users::voted_count + count).le(users::votes)),
                    )
                    .set(users::voted_count.eq(users::voted_count + count))
                    .returning(users::voted_count)
                    .get_result(conn)
                    .await
                    .optional()?;

                    let Some(voter_used) = voter_used else {
                        let quota: Option<(i32, i32)> = users::table
                            .filter(users::id.eq(voter_id))
                            .select((users::votes, users::voted_count))
                            .first(conn)
                            .await
                            .optional()?;
                        return Err(match quota {
                            Some((votes, used)) => BallotTxError::QuotaExceeded {
                                remaining: u32::try_from(votes - used).unwrap_or(0),
                            },
                            None => BallotTxError::VoterMissing,
                        });
                    };

                    diesel::insert_into(votes::table)
                        .values(&NewVoteRow {
                            user_id: voter_id,
                            candidate_id,
                            keyword,
                            voted_count: count,
                        })
                        .on_conflict((votes::user_id, votes::candidate_id, votes::keyword))
                        .do_update()
                        .set(votes::voted_count.eq(votes::voted_count + excluded(votes::voted_count)))
                        .execute(conn)
                        .await?;

                    let candidate_total: i32 = diesel::update(candidates::table.find(candidate_id))
                        .set(candidates::voted_count.eq(candidates::voted_count + count))
                        .returning(candidates::voted_count)
                        .get_result(conn)
                        .await?;

                    Ok((voter_used, candidate_total))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_tx_error)?;

        Ok(LedgerReceipt {
            voter_used: to_count("users.voted_count", voter_used)?,
            candidate_total: i64::from(candidate_total),
        })
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CandidateRow> = candidates::table
            .order(candidates::id.asc())
            .select(CandidateRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_candidate).collect()
    }

    async fn reset_votes(&self) -> Result<(), LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::delete(votes::table).execute(conn).await?;
                diesel::update(users::table)
                    .set(users::voted_count.eq(0))
                    .execute(conn)
                    .await?;
                diesel::update(candidates::table)
                    .set(candidates::voted_count.eq(0))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn tally(&self) -> Result<LedgerTally, LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let (candidate_rows, keyword_rows, voter_rows) = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let candidate_rows: Vec<(i32, i32)> = candidates::table
                        .order(candidates::id.asc())
                        .select((candidates::id, candidates::voted_count))
                        .load(conn)
                        .await?;
                    let keyword_rows: Vec<(i32, String, Option<i64>)> = votes::table
                        .group_by((votes::candidate_id, votes::keyword))
                        .select((
                            votes::candidate_id,
                            votes::keyword,
                            diesel::dsl::sum(votes::voted_count),
                        ))
                        .load(conn)
                        .await?;
                    let voter_rows: Vec<(i32, Option<i64>)> = votes::table
                        .group_by(votes::user_id)
                        .select((votes::user_id, diesel::dsl::sum(votes::voted_count)))
                        .load(conn)
                        .await?;
                    Ok((candidate_rows, keyword_rows, voter_rows))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(LedgerTally {
            candidate_totals: candidate_rows
                .into_iter()
                .map(|(id, votes)| (CandidateId::new(id), i64::from(votes)))
                .collect(),
            keyword_totals: keyword_rows
                .into_iter()
                .map(|(candidate_id, keyword, votes)| KeywordTally {
                    candidate_id: CandidateId::new(candidate_id),
                    keyword,
                    votes: votes.unwrap_or(0),
                })
                .collect(),
            voter_totals: voter_rows
                .into_iter()
                .map(|(id, votes)| (VoterId::new(id), votes.unwrap_or(0)))
                .collect(),
        })
    }
}
