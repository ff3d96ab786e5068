//! Driving port for casting votes.

use async_trait::async_trait;

use crate::domain::{ElectionError, VoteReceipt, VoteRequest};

/// Use-case port for the single write operation of the engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteCommand: Send + Sync {
    /// Validate and record a vote, then update every derived aggregate.
    ///
    /// A request that fails validation performs no writes.
    async fn cast_vote(&self, request: VoteRequest) -> Result<VoteReceipt, ElectionError>;
}
