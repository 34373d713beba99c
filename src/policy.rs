// src/policy.rs
//! What to say after each poll and on each timer, given the shared state.
//!
//! Every function here runs under the state lock and does no I/O: it mutates
//! [`WatchState`] and hands back the texts the caller should send.

use chrono::{DateTime, Utc};

use crate::catalog::{FetchError, ItemRecord};
use crate::config::WatchConfig;
use crate::filter::{classify, Classified};
use crate::history::PollSummary;
use crate::notify::format;
use crate::state::WatchState;

/// How many history entries the digest shows.
pub const DIGEST_HISTORY: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct PollPlan {
    /// Sent first, when this success closes a failure episode.
    pub recovery: Option<String>,
    pub messages: Vec<String>,
    /// Commit these with [`commit_fresh`] once the messages were attempted.
    pub fresh: Vec<ItemRecord>,
    pub summary: PollSummary,
}

pub fn on_poll_success(
    state: &mut WatchState,
    records: Vec<ItemRecord>,
    cfg: &WatchConfig,
    now: DateTime<Utc>,
) -> PollPlan {
    let recovery = state.errors.record_success().map(format::recovery_message);

    let Classified { matched, fresh } =
        classify(records, &cfg.filter(), &state.identities, state.first_run);
    state.first_run = false;

    let messages = format::fresh_items_messages(&fresh, &cfg.listing_url_base);
    if !fresh.is_empty() {
        state.saw_fresh = true;
    }

    let summary = PollSummary {
        at: now,
        total: matched.len(),
        fresh: fresh.len(),
    };
    state.history.push(summary.clone());

    PollPlan {
        recovery,
        messages,
        fresh,
        summary,
    }
}

/// Error alert text when one is due; `None` while rate-limited.
pub fn on_poll_failure(
    state: &mut WatchState,
    err: &FetchError,
    now: DateTime<Utc>,
) -> Option<String> {
    state
        .errors
        .record_failure(now)
        .map(|count| format::error_alert_message(err, count))
}

/// Happens after the send attempt, successful or not. There is no retry path.
pub fn commit_fresh(state: &mut WatchState, fresh: &[ItemRecord]) -> usize {
    state.identities.commit(fresh)
}

/// End of a heartbeat window. The flag is cleared either way.
pub fn on_heartbeat(state: &mut WatchState, now: DateTime<Utc>) -> Option<String> {
    let quiet = !state.saw_fresh;
    state.saw_fresh = false;
    quiet.then(|| format::heartbeat_message(now))
}

pub fn digest(state: &WatchState, cfg: &WatchConfig) -> String {
    format::digest_message(cfg, &state.history.snapshot_last_n(DIGEST_HISTORY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn car(vin: &str, price: Option<f64>) -> ItemRecord {
        ItemRecord {
            vin: vin.into(),
            model: "Model Y".into(),
            year: 2023,
            price,
            odometer: Some(5_000.0),
            city: "Fremont".into(),
            state_province: "CA".into(),
            added_date: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap()
    }

    fn fresh_state() -> (WatchState, WatchConfig) {
        let cfg = WatchConfig::default();
        (WatchState::new(&cfg), cfg)
    }

    #[test]
    fn empty_fresh_sends_nothing_and_commits_nothing() {
        let (mut st, cfg) = fresh_state();
        let plan = on_poll_success(&mut st, vec![], &cfg, t0());
        assert!(plan.messages.is_empty());
        assert_eq!(commit_fresh(&mut st, &plan.fresh), 0);
        assert!(st.identities.is_empty());
        assert!(!st.saw_fresh);
        assert_eq!(st.history.len(), 1);
    }

    #[test]
    fn same_identity_in_consecutive_polls_notifies_once() {
        let (mut st, cfg) = fresh_state();
        let p1 = on_poll_success(&mut st, vec![car("A", Some(30_000.0))], &cfg, t0());
        assert_eq!(p1.messages.len(), 1);
        commit_fresh(&mut st, &p1.fresh);

        let p2 = on_poll_success(&mut st, vec![car("A", Some(30_000.0))], &cfg, t0());
        assert!(p2.messages.is_empty());
        assert_eq!(p2.summary.total, 1);
        assert_eq!(p2.summary.fresh, 0);
    }

    #[test]
    fn price_ceiling_applies_before_alerting() {
        let (mut st, cfg) = fresh_state();
        let plan = on_poll_success(
            &mut st,
            vec![
                car("EQ", Some(31_000.0)),
                car("OVER", Some(31_000.01)),
                car("NULL", None),
            ],
            &cfg,
            t0(),
        );
        let vins: Vec<_> = plan.fresh.iter().map(|c| c.vin.as_str()).collect();
        assert_eq!(vins, vec!["EQ", "NULL"]);
        assert!(plan.messages[0].contains("Price: not listed"));
        assert!(!plan.messages[0].contains("OVER"));
    }

    #[test]
    fn burst_of_failures_alerts_once_with_count() {
        let (mut st, _cfg) = fresh_state();
        let err = FetchError::Status(503);
        let a1 = on_poll_failure(&mut st, &err, t0());
        let a2 = on_poll_failure(&mut st, &err, t0() + ChronoDuration::seconds(120));
        let a3 = on_poll_failure(&mut st, &err, t0() + ChronoDuration::seconds(240));
        assert!(a1.unwrap().contains("(1 in a row): catalog returned HTTP 503"));
        assert!(a2.is_none() && a3.is_none());
        assert_eq!(st.errors.consecutive(), 3);
    }

    #[test]
    fn recovery_fires_once_per_episode() {
        let (mut st, cfg) = fresh_state();
        on_poll_failure(&mut st, &FetchError::Timeout, t0());
        on_poll_failure(&mut st, &FetchError::Timeout, t0());
        let p1 = on_poll_success(&mut st, vec![], &cfg, t0());
        assert_eq!(p1.recovery.as_deref(), Some(format::recovery_message(2).as_str()));
        assert_eq!(st.errors.consecutive(), 0);
        let p2 = on_poll_success(&mut st, vec![], &cfg, t0());
        assert!(p2.recovery.is_none());
    }

    #[test]
    fn heartbeat_reports_quiet_window_and_resets_flag() {
        let (mut st, cfg) = fresh_state();
        assert!(on_heartbeat(&mut st, t0()).is_some());
        assert!(!st.saw_fresh);

        let _ = on_poll_success(&mut st, vec![car("A", None)], &cfg, t0());
        assert!(st.saw_fresh);
        assert!(on_heartbeat(&mut st, t0()).is_none());
        assert!(!st.saw_fresh);
        assert!(on_heartbeat(&mut st, t0()).is_some());
    }

    #[test]
    fn digest_shows_latest_three_oldest_first() {
        let (mut st, cfg) = fresh_state();
        for i in 0..4 {
            let recs = (0..i).map(|j| car(&format!("V{i}{j}"), None)).collect();
            let plan = on_poll_success(&mut st, recs, &cfg, t0() + ChronoDuration::minutes(i));
            commit_fresh(&mut st, &plan.fresh);
        }
        let text = digest(&st, &cfg);
        assert!(!text.contains("09:00:00 UTC"));
        let p1 = text.find("09:01:00 UTC: total 1").unwrap();
        let p2 = text.find("09:02:00 UTC: total 2").unwrap();
        let p3 = text.find("09:03:00 UTC: total 3").unwrap();
        assert!(p1 < p2 && p2 < p3);
    }
}
