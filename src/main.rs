// src/main.rs
//! Binary entrypoint.
//! Loads configuration, starts the poll/heartbeat/digest chains, and serves the
//! status + webhook router.

use inventory_watch::metrics::Metrics;
use inventory_watch::WatchConfig;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs filtered by RUST_LOG. Shuttle installs its own subscriber when it
/// hosts the service; this one only takes effect locally.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("inventory_watch=info,watch=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = WatchConfig::load_default()?;
    tracing::info!(
        models = ?cfg.models,
        max_price = cfg.max_price,
        market = %cfg.market,
        interval_secs = cfg.check_interval_secs,
        jitter_secs = cfg.jitter_secs,
        "starting inventory watch"
    );

    let metrics = Metrics::init()?;
    let (app, _watcher, _handles) = inventory_watch::start(cfg);
    let router = app.merge(metrics.router());

    Ok(router.into())
}
