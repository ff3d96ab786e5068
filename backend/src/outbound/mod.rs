//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL vote ledger using Diesel ORM
//! - **aggregates**: Redis and in-memory aggregate stores
//! - **page_cache**: TTL cache for rendered result pages
//! - **metrics**: Prometheus vote metrics (feature-gated)
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no tallying rules.

pub mod aggregates;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod page_cache;
pub mod persistence;
