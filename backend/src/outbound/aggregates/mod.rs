//! Aggregate store adapters.
//!
//! [`RedisAggregateStore`] is the production backend. [`InMemoryAggregateStore`]
//! shares its tie ordering and serves tests and single-process runs.

mod memory_aggregate_store;
mod redis_aggregate_store;

pub use memory_aggregate_store::InMemoryAggregateStore;
pub use redis_aggregate_store::{DEFAULT_AGGREGATE_PREFIX, RedisAggregateStore};
