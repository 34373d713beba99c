// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod catalog;
pub mod config;
pub mod escalation;
pub mod filter;
pub mod history;
pub mod identity;
pub mod metrics;
pub mod notify;
pub mod policy;
pub mod scheduler;
pub mod state;

use std::sync::Arc;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::catalog::{CatalogSource, FetchError, HttpCatalog, ItemRecord};
pub use crate::config::WatchConfig;
pub use crate::notify::{LogNotifier, Notifier, NotifyError, TelegramCredentials, TelegramNotifier};
pub use crate::scheduler::{PollOutcome, WatchHandles, Watcher};

/// Telegram when `TELEGRAM_BOT_TOKEN`/`TELEGRAM_CHAT_ID` are set, log-only otherwise.
pub fn notifier_from_env(cfg: &WatchConfig) -> Arc<dyn Notifier> {
    match TelegramCredentials::from_env() {
        Some(creds) => Arc::new(
            TelegramNotifier::new(creds)
                .with_api_base(cfg.telegram_api_base.clone())
                .with_timeout(cfg.send_timeout()),
        ),
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID not set, messages go to the log only");
            Arc::new(LogNotifier)
        }
    }
}

/// Wire the watcher against the real catalog, start its chains, and return the router.
///
/// Must run inside a tokio runtime.
pub fn start(cfg: WatchConfig) -> (axum::Router, Arc<Watcher>, WatchHandles) {
    let catalog: Arc<dyn CatalogSource> = Arc::new(HttpCatalog::new(&cfg));
    let notifier = notifier_from_env(&cfg);
    let watcher = Arc::new(Watcher::new(cfg, catalog, notifier));
    let handles = watcher.spawn();
    let app = router(api::AppState {
        watcher: watcher.clone(),
    });
    (app, watcher, handles)
}
