//! PostgreSQL ledger adapter using Diesel ORM.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay private
//! to this module; the domain only sees [`DieselVoteLedger`] through the
//! `VoteLedger` port.
//!
//! # Example
//!
//! ```ignore
//! use election::outbound::persistence::{DbPool, DieselVoteLedger, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/election")).await?;
//! let ledger = DieselVoteLedger::new(pool);
//! ```

mod diesel_vote_ledger;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_vote_ledger::DieselVoteLedger;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
