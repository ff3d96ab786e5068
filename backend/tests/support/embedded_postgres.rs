//! Per-test ledger databases on an embedded cluster.
//!
//! Databases are created with the `postgres` client so no Diesel transaction
//! wraps `CREATE DATABASE`; the schema comes from the crate's embedded
//! migrations so tests never drift from production.

use election::outbound::persistence::run_pending_migrations;
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};
use uuid::Uuid;

use super::format_postgres_error;

/// Create an empty, fully migrated database and return its URL.
pub fn provision_ledger_database(cluster: &TestCluster) -> Result<String, String> {
    let name = format!("ledger_{}", Uuid::new_v4().simple());
    let admin_url = cluster.connection().database_url("postgres");
    let mut admin = Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    admin
        .batch_execute(&format!("CREATE DATABASE \"{name}\""))
        .map_err(|err| format_postgres_error(&err))?;

    let url = cluster.connection().database_url(&name);
    run_pending_migrations(&url).map_err(|err| err.to_string())?;
    Ok(url)
}

/// Open a plain client for seeding rows the ports never write.
pub fn seed_client(url: &str) -> Result<Client, String> {
    Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))
}
