//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses or any other protocol-specific envelope via [`ErrorCode`].
//!
//! Validation failures (`MissingCandidate`, `MissingKeyword`,
//! `KeywordTooLong`, `InvalidVoteCount`, `UnknownCandidate`, `UnknownParty`, `UserNotFound`,
//! `QuotaExceeded`) are expected user-facing outcomes and are never retried.
//! `StoreUnavailable` and `QueryFailed` describe infrastructure failures; the
//! caller decides whether to retry.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// A referenced candidate or party does not exist.
    NotFound,
    /// The voter could not be identified from the supplied details.
    Unauthorized,
    /// The voter has no remaining quota for the requested votes.
    QuotaExceeded,
    /// A backing store is unavailable; the request may be retried.
    ServiceUnavailable,
}

/// Failures raised by the vote tallying engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElectionError {
    /// The candidate field was empty.
    #[error("candidate must be provided")]
    MissingCandidate,
    /// The keyword (reason) field was empty.
    #[error("keyword must be provided")]
    MissingKeyword,
    /// The keyword is longer than the ledger can store.
    #[error("keyword must be at most {max} characters")]
    KeywordTooLong { max: usize },
    /// The requested vote count is not a positive integer.
    #[error("vote count must be at least 1, got {count}")]
    InvalidVoteCount { count: i64 },
    /// The candidate name or identifier does not resolve.
    #[error("unknown candidate: {candidate}")]
    UnknownCandidate { candidate: String },
    /// No candidate belongs to the requested party.
    #[error("unknown political party: {party}")]
    UnknownParty { party: String },
    /// The three-factor identity match failed.
    ///
    /// The message deliberately does not reveal which field mismatched.
    #[error("voter details are incorrect")]
    UserNotFound,
    /// The vote would push the voter past their quota.
    #[error("requested {requested} votes but only {remaining} remain")]
    QuotaExceeded { requested: u32, remaining: u32 },
    /// The ledger or aggregate store failed during a write.
    #[error("store unavailable: {message}")]
    StoreUnavailable { message: String },
    /// The ledger or aggregate store failed during a read.
    #[error("query failed: {message}")]
    QueryFailed { message: String },
}

impl ElectionError {
    /// Convenience constructor for [`ElectionError::UnknownCandidate`].
    pub fn unknown_candidate(candidate: impl Into<String>) -> Self {
        Self::UnknownCandidate {
            candidate: candidate.into(),
        }
    }

    /// Convenience constructor for [`ElectionError::UnknownParty`].
    pub fn unknown_party(party: impl Into<String>) -> Self {
        Self::UnknownParty {
            party: party.into(),
        }
    }

    /// Convenience constructor for [`ElectionError::StoreUnavailable`].
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`ElectionError::QueryFailed`].
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingCandidate
            | Self::MissingKeyword
            | Self::KeywordTooLong { .. }
            | Self::InvalidVoteCount { .. } => ErrorCode::InvalidRequest,
            Self::UnknownCandidate { .. } | Self::UnknownParty { .. } => ErrorCode::NotFound,
            Self::UserNotFound => ErrorCode::Unauthorized,
            Self::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            Self::StoreUnavailable { .. } | Self::QueryFailed { .. } => {
                ErrorCode::ServiceUnavailable
            }
        }
    }

    /// Whether the failure stems from infrastructure rather than user input.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self.code(), ErrorCode::ServiceUnavailable)
    }
}
