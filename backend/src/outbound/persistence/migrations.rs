//! Embedded schema migrations for the vote ledger.
//!
//! Migrations run over a short-lived synchronous connection, so call
//! [`run_pending_migrations`] from a blocking context.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while bringing the ledger schema up to date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    #[error("failed to connect for migrations: {message}")]
    Connection { message: String },
    #[error("failed to apply migrations: {message}")]
    Apply { message: String },
}

/// Apply every migration not yet recorded in `database_url`.
///
/// Returns the number of migrations applied.
pub fn run_pending_migrations(database_url: &str) -> Result<usize, MigrationError> {
    let mut conn = PgConnection::establish(database_url).map_err(|err| {
        MigrationError::Connection {
            message: err.to_string(),
        }
    })?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })?;
    for version in &applied {
        info!(%version, "applied ledger migration");
    }
    Ok(applied.len())
}
