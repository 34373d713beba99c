// src/escalation.rs
use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Consecutive fetch failures and the alert cooldown that rides on them.
/// - The first failure of an episode always alerts.
/// - Inside the window, further failures only count.
/// - The first success after an episode reports recovery once.
#[derive(Debug, Clone)]
pub struct ErrorState {
    window: ChronoDuration,
    consecutive: u32,
    last_alert_at: Option<DateTime<Utc>>,
    in_error: bool,
}

impl ErrorState {
    /// `window` longer than chrono can represent is clamped.
    pub fn new(window: std::time::Duration) -> Self {
        Self {
            window: ChronoDuration::from_std(window).unwrap_or(ChronoDuration::MAX),
            consecutive: 0,
            last_alert_at: None,
            in_error: false,
        }
    }

    /// Check if a failure at `now` should alert. Does NOT mutate state.
    pub fn should_alert(&self, now: DateTime<Utc>) -> bool {
        if self.consecutive == 0 {
            return true;
        }
        match self.last_alert_at {
            None => true,
            Some(ts) => now.signed_duration_since(ts) >= self.window,
        }
    }

    /// Count a failure. Returns the consecutive count when an alert is due, and
    /// stamps the alert time in that case.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> Option<u32> {
        let alert = self.should_alert(now);
        self.consecutive = self.consecutive.saturating_add(1);
        self.in_error = true;
        if alert {
            self.last_alert_at = Some(now);
            Some(self.consecutive)
        } else {
            None
        }
    }

    /// Clear the episode. Returns how many failures it had if one was open.
    pub fn record_success(&mut self) -> Option<u32> {
        let was = self.in_error.then_some(self.consecutive);
        self.consecutive = 0;
        self.in_error = false;
        was
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn in_error(&self) -> bool {
        self.in_error
    }

    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.last_alert_at
    }
}
