//! Port for recording vote outcomes in a metrics backend.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised while recording vote metrics.
    pub enum VoteMetricsError {
        /// Metrics exporter failed to record the outcome.
        Export { message: String } => "vote metrics export failed: {message}",
    }
}

/// Outcome label attached to each recorded vote attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteOutcome {
    Accepted,
    Rejected,
    Failed,
}

impl VoteOutcome {
    /// Label value used by exporters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

/// Records vote attempts by outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteMetrics: Send + Sync {
    /// Record one vote attempt carrying `votes` votes.
    async fn record(&self, outcome: VoteOutcome, votes: u32) -> Result<(), VoteMetricsError>;
}

/// Metrics recorder that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpVoteMetrics;

#[async_trait]
impl VoteMetrics for NoOpVoteMetrics {
    async fn record(&self, _outcome: VoteOutcome, _votes: u32) -> Result<(), VoteMetricsError> {
        Ok(())
    }
}
