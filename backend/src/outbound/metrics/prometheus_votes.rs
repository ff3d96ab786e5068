//! Prometheus adapter for vote outcome metrics.

use async_trait::async_trait;
use prometheus::{IntCounterVec, Opts, Registry};

use crate::domain::ports::{VoteMetrics, VoteMetricsError, VoteOutcome};

/// Prometheus-backed vote metrics recorder.
///
/// # Metrics
///
/// - `election_vote_requests_total{outcome}`: vote attempts
/// - `election_votes_cast_total{outcome}`: votes carried by those attempts
///
/// `outcome` is `accepted`, `rejected`, or `failed`.
pub struct PrometheusVoteMetrics {
    requests_total: IntCounterVec,
    votes_total: IntCounterVec,
}

impl PrometheusVoteMetrics {
    /// Create and register metrics with the given registry.
    ///
    /// # Errors
    ///
    /// Returns an error if either metric is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                "election_vote_requests_total",
                "Vote attempts by outcome",
            ),
            &["outcome"],
        )?;
        let votes_total = IntCounterVec::new(
            Opts::new(
                "election_votes_cast_total",
                "Votes carried by vote attempts, by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(votes_total.clone()))?;
        Ok(Self {
            requests_total,
            votes_total,
        })
    }
}

#[async_trait]
impl VoteMetrics for PrometheusVoteMetrics {
    async fn record(&self, outcome: VoteOutcome, votes: u32) -> Result<(), VoteMetricsError> {
        let label = [outcome.as_str()];
        self.requests_total.with_label_values(&label).inc();
        self.votes_total
            .with_label_values(&label)
            .inc_by(u64::from(votes));
        Ok(())
    }
}
