// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("watch_polls_total", "Catalog polls started.");
        describe_counter!("watch_fetch_errors_total", "Catalog polls that failed.");
        describe_counter!(
            "watch_fresh_items_total",
            "Listings announced as new."
        );
        describe_counter!(
            "watch_notify_failures_total",
            "Outbound messages that could not be delivered."
        );
        describe_gauge!("watch_identities", "Identities in the seen set.");
        describe_gauge!("watch_last_poll_ts", "Unix ts of the last successful poll.");
        describe_histogram!("watch_fetch_ms", "Catalog fetch time in milliseconds.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
