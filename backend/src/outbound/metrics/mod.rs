//! Prometheus exporters, available with the `metrics` feature.

mod prometheus_votes;

pub use prometheus_votes::PrometheusVoteMetrics;
