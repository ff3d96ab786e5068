//! Election server entry-point: loads settings, migrates the ledger, wires the
//! aggregate store, and serves the REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use election::domain::ports::{PageCache, VoteMetrics};
use election::inbound::http::health::HealthState;
use election::outbound::aggregates::{InMemoryAggregateStore, RedisAggregateStore};
use election::outbound::page_cache::InMemoryPageCache;
use election::outbound::persistence::{DbPool, DieselVoteLedger, run_pending_migrations};
use election::settings::ElectionSettings;

use server::{ServerConfig, build_http_state, create_server};

#[cfg(feature = "metrics")]
fn vote_metrics(config: ServerConfig) -> Result<(ServerConfig, Arc<dyn VoteMetrics>)> {
    use actix_web_prom::PrometheusMetricsBuilder;
    use election::outbound::metrics::PrometheusVoteMetrics;

    let registry = prometheus::Registry::new();
    let votes = PrometheusVoteMetrics::new(&registry).wrap_err("register vote metrics")?;
    let prometheus = PrometheusMetricsBuilder::new("election")
        .endpoint("/metrics")
        .registry(registry)
        .build()
        .map_err(|err| eyre!("configure Prometheus metrics: {err}"))?;
    Ok((config.with_metrics(prometheus), Arc::new(votes)))
}

#[cfg(not(feature = "metrics"))]
fn vote_metrics(config: ServerConfig) -> Result<(ServerConfig, Arc<dyn VoteMetrics>)> {
    use election::domain::ports::NoOpVoteMetrics;

    Ok((config, Arc::new(NoOpVoteMetrics)))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        ElectionSettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let pool_config = settings.pool_config()?;
    let (config, metrics) = vote_metrics(ServerConfig::new(settings.bind_addr()?))?;

    let database_url = pool_config.database_url().to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&database_url))
        .await
        .wrap_err("migration task aborted")??;
    info!(applied, "ledger schema is current");

    let ledger = Arc::new(DieselVoteLedger::new(DbPool::new(pool_config).await?));
    let page_cache: Arc<dyn PageCache> = Arc::new(InMemoryPageCache::new(settings.page_cache_ttl()));

    let (http_state, aggregates_in_memory) = match settings.redis_url.as_deref() {
        Some(url) => {
            let store = RedisAggregateStore::connect(
                url,
                settings.aggregate_prefix(),
                settings.db_max_connections,
            )
            .await?;
            store.ping().await?;
            let state = build_http_state(ledger, Arc::new(store), page_cache, metrics);
            (state, false)
        }
        None => {
            warn!("no Redis URL configured; aggregates are held in process memory");
            let store = Arc::new(InMemoryAggregateStore::new());
            (build_http_state(ledger, store, page_cache, metrics), true)
        }
    };

    // An in-process store starts empty and must be derived from the ledger.
    if aggregates_in_memory {
        http_state.admin.rebuild_aggregates().await?;
    } else {
        let candidates = http_state.admin.load_directory().await?;
        info!(candidates, "candidate directory loaded");
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), http_state, config)?;
    health_state.mark_ready();
    server.await?;
    health_state.mark_unhealthy();
    Ok(())
}
