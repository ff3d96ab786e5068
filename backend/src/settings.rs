//! Service configuration loaded via OrthoConfig.
//!
//! Values layer from defaults, a config file, `ELECTION_*` environment
//! variables, and command-line flags, in that order of precedence.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::aggregates::DEFAULT_AGGREGATE_PREFIX;
use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Runtime settings for the election server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ELECTION")]
pub struct ElectionSettings {
    /// PostgreSQL connection string for the vote ledger.
    pub database_url: Option<String>,
    /// Redis connection string for the aggregate store. Aggregates are kept
    /// in process memory when unset.
    pub redis_url: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Upper bound on ledger connections.
    #[ortho_config(default = 40)]
    pub db_max_connections: u32,
    /// Key prefix for every aggregate collection.
    pub aggregate_prefix: Option<String>,
    /// Seconds a rendered results page stays cached.
    #[ortho_config(default = 60)]
    pub page_cache_ttl_secs: u64,
}

/// Invalid settings detected after loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("ELECTION_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("invalid bind address {value}: {message}")]
    InvalidBindAddr { value: String, message: String },
    #[error("db_max_connections must be at least 1")]
    NoConnections,
}

impl ElectionSettings {
    /// Parsed bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value
            .parse()
            .map_err(|err: std::net::AddrParseError| SettingsError::InvalidBindAddr {
                value: value.to_owned(),
                message: err.to_string(),
            })
    }

    /// Aggregate key prefix, falling back to the default.
    pub fn aggregate_prefix(&self) -> &str {
        self.aggregate_prefix
            .as_deref()
            .unwrap_or(DEFAULT_AGGREGATE_PREFIX)
    }

    /// Ledger pool configuration.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let url = self
            .database_url
            .as_deref()
            .ok_or(SettingsError::MissingDatabaseUrl)?;
        if self.db_max_connections == 0 {
            return Err(SettingsError::NoConnections);
        }
        Ok(PoolConfig::new(url).with_max_size(self.db_max_connections))
    }

    /// Page cache time-to-live.
    pub fn page_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.page_cache_ttl_secs)
    }
}
