// src/scheduler.rs
//! The three timer chains (poll, heartbeat, digest) and the [`Watcher`] they drive.

use chrono::Utc;
use metrics::{counter, gauge};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::catalog::{CatalogSource, FetchError, ItemRecord};
use crate::config::WatchConfig;
use crate::identity::CachedEntry;
use crate::metrics::ensure_metrics_described;
use crate::notify::{deliver_to, format, Notifier};
use crate::policy;
use crate::state::{self, SharedState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Fetched { matched: usize, fresh: usize },
    Failed { consecutive: u32, alerted: bool },
}

pub struct Watcher {
    cfg: Arc<WatchConfig>,
    state: SharedState,
    catalog: Arc<dyn CatalogSource>,
    notifier: Arc<dyn Notifier>,
}

impl Watcher {
    pub fn new(
        cfg: WatchConfig,
        catalog: Arc<dyn CatalogSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let state = state::shared(&cfg);
        Self {
            cfg: Arc::new(cfg),
            state,
            catalog,
            notifier,
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.cfg
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Send with the configured timeout; failures end up in the log only.
    pub async fn say_to(&self, chat_id: &str, text: &str) -> bool {
        let send = deliver_to(self.notifier.as_ref(), chat_id, text);
        match time::timeout(self.cfg.send_timeout(), send).await {
            Ok(sent) => sent,
            Err(_) => {
                tracing::warn!(target: "watch", chat_id, "notification timed out");
                counter!("watch_notify_failures_total").increment(1);
                false
            }
        }
    }

    pub async fn say(&self, text: &str) -> bool {
        self.say_to(self.notifier.default_chat(), text).await
    }

    async fn fetch(&self) -> Result<Vec<ItemRecord>, FetchError> {
        match time::timeout(self.cfg.fetch_timeout(), self.catalog.fetch_latest()).await {
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout),
        }
    }

    /// One full cycle: fetch, classify, announce, commit.
    pub async fn poll_once(&self) -> PollOutcome {
        ensure_metrics_described();
        counter!("watch_polls_total").increment(1);

        let now = Utc::now();
        match self.fetch().await {
            Ok(records) => {
                let plan = {
                    let mut st = self.state.lock().await;
                    policy::on_poll_success(&mut st, records, &self.cfg, now)
                };

                if let Some(text) = &plan.recovery {
                    tracing::info!(target: "watch", "catalog recovered");
                    self.say(text).await;
                }
                for text in &plan.messages {
                    self.say(text).await;
                }

                let identities = {
                    let mut st = self.state.lock().await;
                    policy::commit_fresh(&mut st, &plan.fresh);
                    st.identities.len()
                };

                counter!("watch_fresh_items_total").increment(plan.fresh.len() as u64);
                gauge!("watch_identities").set(identities as f64);
                gauge!("watch_last_poll_ts").set(now.timestamp() as f64);
                tracing::info!(
                    target: "watch",
                    matched = plan.summary.total,
                    fresh = plan.summary.fresh,
                    identities,
                    "poll finished"
                );

                PollOutcome::Fetched {
                    matched: plan.summary.total,
                    fresh: plan.summary.fresh,
                }
            }
            Err(e) => {
                let (alert, consecutive) = {
                    let mut st = self.state.lock().await;
                    let alert = policy::on_poll_failure(&mut st, &e, now);
                    (alert, st.errors.consecutive())
                };
                counter!("watch_fetch_errors_total").increment(1);
                tracing::warn!(target: "watch", error = %e, consecutive, "poll failed");
                if let Some(text) = &alert {
                    self.say(text).await;
                }
                PollOutcome::Failed {
                    consecutive,
                    alerted: alert.is_some(),
                }
            }
        }
    }

    /// End of one heartbeat window. Returns whether a "nothing new" notice went out.
    pub async fn heartbeat_once(&self) -> bool {
        let notice = {
            let mut st = self.state.lock().await;
            policy::on_heartbeat(&mut st, Utc::now())
        };
        match notice {
            Some(text) => self.say(&text).await,
            None => {
                tracing::debug!(target: "watch", "heartbeat: fresh items seen this window");
                false
            }
        }
    }

    pub async fn digest_text(&self) -> String {
        let st = self.state.lock().await;
        policy::digest(&st, &self.cfg)
    }

    pub async fn digest_once(&self) -> bool {
        let text = self.digest_text().await;
        self.say(&text).await
    }

    pub async fn cached_entries(&self) -> Vec<CachedEntry> {
        self.state.lock().await.identities.entries()
    }

    pub async fn cached_dump(&self) -> Vec<String> {
        let records = self.state.lock().await.identities.retained();
        format::cached_dump_messages(&records)
    }

    /// Start all three chains.
    pub fn spawn(self: &Arc<Self>) -> WatchHandles {
        WatchHandles {
            poll: spawn_poll_loop(self.clone()),
            heartbeat: spawn_heartbeat_loop(self.clone()),
            digest: spawn_digest_loop(self.clone()),
        }
    }
}

/// `base ± uniform(jitter)` whole seconds, never below one second.
pub fn next_delay<R: Rng>(base_secs: u64, jitter_secs: u64, rng: &mut R) -> Duration {
    let j = jitter_secs.min(i64::MAX as u64) as i64;
    let offset = if j == 0 { 0 } else { rng.random_range(-j..=j) };
    let secs = (base_secs.min(i64::MAX as u64) as i64).saturating_add(offset).max(1);
    Duration::from_secs(secs as u64)
}

/// Polls back to back; the next wait starts only after the previous cycle finished.
pub fn spawn_poll_loop(watcher: Arc<Watcher>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let outcome = watcher.poll_once().await;
            let delay = next_delay(
                watcher.cfg.check_interval_secs,
                watcher.cfg.jitter_secs,
                &mut rand::rng(),
            );
            tracing::debug!(target: "watch", ?outcome, delay_secs = delay.as_secs(), "next poll scheduled");
            time::sleep(delay).await;
        }
    })
}

fn spawn_periodic<F, Fut>(period: Duration, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        // First firing one full period after start.
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            tick().await;
        }
    })
}

pub fn spawn_heartbeat_loop(watcher: Arc<Watcher>) -> JoinHandle<()> {
    let period = watcher.cfg.heartbeat_period();
    spawn_periodic(period, move || {
        let w = watcher.clone();
        async move {
            w.heartbeat_once().await;
        }
    })
}

pub fn spawn_digest_loop(watcher: Arc<Watcher>) -> JoinHandle<()> {
    let period = watcher.cfg.digest_period();
    spawn_periodic(period, move || {
        let w = watcher.clone();
        async move {
            w.digest_once().await;
        }
    })
}

/// Independently abortable chains. Dropping this does not stop them.
pub struct WatchHandles {
    pub poll: JoinHandle<()>,
    pub heartbeat: JoinHandle<()>,
    pub digest: JoinHandle<()>,
}

impl WatchHandles {
    pub fn abort_all(&self) {
        self.poll.abort();
        self.heartbeat.abort();
        self.digest.abort();
    }
}
