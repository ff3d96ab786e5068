//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`VoteLedger`], [`AggregateStore`], [`PageCache`],
//! [`VoteMetrics`]) are implemented by outbound adapters. Driving ports
//! ([`VoteCommand`], [`ElectionQuery`], [`ElectionAdmin`]) are implemented by
//! domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod aggregate_store;
mod election_admin;
mod election_query;
mod page_cache;
mod vote_command;
mod vote_ledger;
mod vote_metrics;

#[cfg(test)]
pub use aggregate_store::MockAggregateStore;
pub use aggregate_store::{
    AggregateCollection, AggregateSnapshot, AggregateStore, AggregateStoreError, ScoredMember,
    candidate_member, parse_candidate_member,
};
#[cfg(test)]
pub use election_admin::MockElectionAdmin;
pub use election_admin::ElectionAdmin;
#[cfg(test)]
pub use election_query::MockElectionQuery;
pub use election_query::ElectionQuery;
#[cfg(test)]
pub use page_cache::MockPageCache;
pub use page_cache::{NoPageCache, PageCache};
#[cfg(test)]
pub use vote_command::MockVoteCommand;
pub use vote_command::VoteCommand;
#[cfg(test)]
pub use vote_ledger::MockVoteLedger;
pub use vote_ledger::{KeywordTally, LedgerError, LedgerTally, VoteLedger};
#[cfg(test)]
pub use vote_metrics::MockVoteMetrics;
pub use vote_metrics::{NoOpVoteMetrics, VoteMetrics, VoteMetricsError, VoteOutcome};
