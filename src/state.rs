// src/state.rs
//! All mutable watcher state, behind one lock shared by the timer chains and the API.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::WatchConfig;
use crate::escalation::ErrorState;
use crate::history::History;
use crate::identity::IdentityStore;

#[derive(Debug)]
pub struct WatchState {
    pub identities: IdentityStore,
    pub errors: ErrorState,
    pub history: History,
    /// Set when a poll found something fresh; cleared at every heartbeat.
    pub saw_fresh: bool,
    /// Cleared by the first successful poll.
    pub first_run: bool,
}

impl WatchState {
    pub fn new(cfg: &WatchConfig) -> Self {
        Self {
            identities: IdentityStore::new(cfg.retain_records),
            errors: ErrorState::new(cfg.escalation_window()),
            history: History::default(),
            saw_fresh: false,
            first_run: true,
        }
    }
}

pub type SharedState = Arc<Mutex<WatchState>>;

pub fn shared(cfg: &WatchConfig) -> SharedState {
    Arc::new(Mutex::new(WatchState::new(cfg)))
}
