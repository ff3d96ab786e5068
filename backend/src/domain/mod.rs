//! Domain primitives, ports, and services for vote tallying.
//!
//! Purpose: keep the tallying rules (quota enforcement, identity matching,
//! ledger-first writes, leaderboard composition) independent of any store or
//! transport. Adapters plug in through [`ports`].
//!
//! Public surface:
//! - `VoteService`: implements [`ports::VoteCommand`].
//! - `ElectionQueryService`: implements [`ports::ElectionQuery`].
//! - `ElectionAdminService`: implements [`ports::ElectionAdmin`].
//! - `CandidateRegistry`: process-wide candidate lookup tables.
//! - `TallyGate`: keeps aggregate rewrites from interleaving with ballots.

mod admin_service;
mod ballot;
mod candidate;
mod error;
pub mod ports;
mod query_service;
mod standings;
mod tally_gate;
mod vote_service;
mod voter;

pub use self::admin_service::ElectionAdminService;
pub use self::ballot::{Ballot, LedgerReceipt, MAX_KEYWORD_CHARS, VoteReceipt, VoteRequest};
pub use self::candidate::{
    Candidate, CandidateDirectory, CandidateId, CandidateRegistry, ParseSexError, Sex,
};
pub use self::error::{ElectionError, ErrorCode};
pub use self::query_service::ElectionQueryService;
pub use self::standings::{
    CandidateDetail, CandidateStanding, ElectionSummary, KeywordScore, Leaderboard, PartyDetail,
    PartyStanding, SexRatio, TOP_N, TallyDrift,
};
pub use self::tally_gate::TallyGate;
pub use self::vote_service::VoteService;
pub use self::voter::{Voter, VoterCredentials, VoterId};
