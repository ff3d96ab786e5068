//! Redis-backed `AggregateStore` using `bb8-redis` connection pooling.
//!
//! Every collection is a sorted set and every voter counter a plain integer
//! key, all namespaced under a configurable prefix:
//!
//! - `{prefix}:candidates` global ranking, members `candidate:{id}`
//! - `{prefix}:candidate:{id}:keywords`
//! - `{prefix}:party:{name}:keywords`
//! - `{prefix}:user:{id}:votes`
//!
//! Multi-key writes go through `MULTI`/`EXEC` pipelines so readers never see
//! half of a ballot.

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, RunError};
use bb8_redis::redis::{self, RedisError};
use tracing::debug;

use crate::domain::ports::{
    AggregateCollection, AggregateSnapshot, AggregateStore, AggregateStoreError, ScoredMember,
    candidate_member,
};
use crate::domain::{Ballot, CandidateId, VoterId};

/// Default key namespace.
pub const DEFAULT_AGGREGATE_PREFIX: &str = "election";

const SCAN_BATCH: usize = 500;

/// Aggregate store backed by Redis sorted sets.
#[derive(Clone)]
pub struct RedisAggregateStore {
    pool: Pool<RedisConnectionManager>,
    prefix: String,
}

fn map_redis_error(error: RedisError) -> AggregateStoreError {
    debug!(error = %error, "redis operation failed");
    AggregateStoreError::backend(error.to_string())
}

fn map_run_error(error: RunError<RedisError>) -> AggregateStoreError {
    match error {
        RunError::User(err) => map_redis_error(err),
        RunError::TimedOut => AggregateStoreError::backend("timed out waiting for a connection"),
    }
}

/// Convert a sorted set score into an integer vote count.
///
/// Scores are only ever written as whole numbers, so a fractional or
/// non-finite score means the key was written by something else.
fn score_to_votes(score: f64) -> Result<i64, AggregateStoreError> {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    if !score.is_finite() || score.fract() != 0.0 || score.abs() > LIMIT {
        return Err(AggregateStoreError::decode(format!(
            "score {score} is not a whole vote count"
        )));
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "score is finite, integral, and within the exact f64 integer range"
    )]
    Ok(score as i64)
}

fn scored_members(raw: Vec<(String, f64)>) -> Result<Vec<ScoredMember>, AggregateStoreError> {
    raw.into_iter()
        .map(|(member, score)| Ok(ScoredMember::new(member, score_to_votes(score)?)))
        .collect()
}

impl RedisAggregateStore {
    /// Connect to `redis_url` and namespace every key under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `AggregateStoreError::Backend` when the URL is invalid or the
    /// pool cannot be built.
    pub async fn connect(
        redis_url: &str,
        prefix: impl Into<String>,
        max_connections: u32,
    ) -> Result<Self, AggregateStoreError> {
        let manager = RedisConnectionManager::new(redis_url).map_err(map_redis_error)?;
        let pool = Pool::builder()
            .max_size(max_connections)
            .build(manager)
            .await
            .map_err(map_redis_error)?;
        Ok(Self::from_pool(pool, prefix))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: Pool<RedisConnectionManager>, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    fn collection_key(&self, collection: &AggregateCollection) -> String {
        format!("{}:{collection}", self.prefix)
    }

    fn voter_key(&self, voter_id: VoterId) -> String {
        format!("{}:user:{voter_id}:votes", self.prefix)
    }

    fn key_pattern(&self) -> String {
        format!("{}:*", self.prefix)
    }

    /// Confirm Redis answers a `PING`.
    ///
    /// # Errors
    ///
    /// Returns `AggregateStoreError::Backend` when Redis is unreachable.
    pub async fn ping(&self) -> Result<(), AggregateStoreError> {
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn scan_keys(&self) -> Result<Vec<String>, AggregateStoreError> {
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let pattern = self.key_pattern();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut *conn)
                .await
                .map_err(map_redis_error)?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }
}

#[async_trait]
impl AggregateStore for RedisAggregateStore {
    async fn increment(
        &self,
        collection: &AggregateCollection,
        member: &str,
        delta: i64,
    ) -> Result<i64, AggregateStoreError> {
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let score: f64 = redis::cmd("ZINCRBY")
            .arg(self.collection_key(collection))
            .arg(delta)
            .arg(member)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        score_to_votes(score)
    }

    async fn apply_ballot(&self, ballot: &Ballot) -> Result<(), AggregateStoreError> {
        let count = i64::from(ballot.count);
        let candidate_keywords =
            self.collection_key(&AggregateCollection::CandidateKeywords(ballot.candidate_id));
        let party_keywords = self.collection_key(&AggregateCollection::PartyKeywords(
            ballot.political_party.clone(),
        ));
        let global = self.collection_key(&AggregateCollection::Candidates);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("ZINCRBY")
            .arg(&candidate_keywords)
            .arg(count)
            .arg(&ballot.keyword)
            .ignore()
            .cmd("ZINCRBY")
            .arg(&party_keywords)
            .arg(count)
            .arg(&ballot.keyword)
            .ignore()
            .cmd("ZINCRBY")
            .arg(&global)
            .arg(count)
            .arg(candidate_member(ballot.candidate_id))
            .ignore()
            .cmd("INCRBY")
            .arg(self.voter_key(ballot.voter_id))
            .arg(count)
            .ignore();

        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let _: () = pipe
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn top_n(
        &self,
        collection: &AggregateCollection,
        n: usize,
    ) -> Result<Vec<ScoredMember>, AggregateStoreError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let stop = isize::try_from(n - 1).unwrap_or(-1);
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let raw: Vec<(String, f64)> = redis::cmd("ZREVRANGE")
            .arg(self.collection_key(collection))
            .arg(0)
            .arg(stop)
            .arg("WITHSCORES")
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        scored_members(raw)
    }

    async fn bottom(
        &self,
        collection: &AggregateCollection,
    ) -> Result<Option<ScoredMember>, AggregateStoreError> {
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let raw: Vec<(String, f64)> = redis::cmd("ZRANGE")
            .arg(self.collection_key(collection))
            .arg(0)
            .arg(0)
            .arg("WITHSCORES")
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(scored_members(raw)?.into_iter().next())
    }

    async fn score_of(
        &self,
        collection: &AggregateCollection,
        member: &str,
    ) -> Result<Option<i64>, AggregateStoreError> {
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let score: Option<f64> = redis::cmd("ZSCORE")
            .arg(self.collection_key(collection))
            .arg(member)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        score.map(score_to_votes).transpose()
    }

    async fn voter_total(&self, voter_id: VoterId) -> Result<i64, AggregateStoreError> {
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let total: Option<i64> = redis::cmd("GET")
            .arg(self.voter_key(voter_id))
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(total.unwrap_or(0))
    }

    async fn seed_candidates(&self, ids: &[CandidateId]) -> Result<(), AggregateStoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut cmd = redis::cmd("ZADD");
        cmd.arg(self.collection_key(&AggregateCollection::Candidates))
            .arg("NX");
        for id in ids {
            cmd.arg(0).arg(candidate_member(*id));
        }

        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let _: i64 = cmd
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn replace_all(&self, snapshot: &AggregateSnapshot) -> Result<(), AggregateStoreError> {
        let existing = self.scan_keys().await?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        if !existing.is_empty() {
            pipe.cmd("DEL").arg(&existing).ignore();
        }
        for (collection, members) in &snapshot.collections {
            if members.is_empty() {
                continue;
            }
            let zadd = pipe.cmd("ZADD").arg(self.collection_key(collection));
            for scored in members {
                zadd.arg(scored.score).arg(&scored.member);
            }
            zadd.ignore();
        }
        for (voter_id, votes) in &snapshot.voter_totals {
            pipe.cmd("SET")
                .arg(self.voter_key(*voter_id))
                .arg(*votes)
                .ignore();
        }

        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        let _: () = pipe
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        debug!(
            removed = existing.len(),
            collections = snapshot.collections.len(),
            "aggregate store replaced"
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), AggregateStoreError> {
        let keys = self.scan_keys().await?;
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(map_run_error)?;
        for chunk in keys.chunks(SCAN_BATCH) {
            let _: i64 = redis::cmd("DEL")
                .arg(chunk)
                .query_async(&mut *conn)
                .await
                .map_err(map_redis_error)?;
        }
        debug!(removed = keys.len(), "aggregate store cleared");
        Ok(())
    }
}
