//! HTTP server configuration object.

use std::net::SocketAddr;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Configuration binding to `bind_addr`.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware serving `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: PrometheusMetrics) -> Self {
        self.prometheus = Some(prometheus);
        self
    }
}
