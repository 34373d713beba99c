// src/history.rs
//! Bounded record of recent successful polls, for the digest only.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PollSummary {
    pub at: DateTime<Utc>,
    /// Candidates left after filtering.
    pub total: usize,
    pub fresh: usize,
}

#[derive(Debug)]
pub struct History {
    inner: VecDeque<PollSummary>,
    cap: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            inner: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, entry: PollSummary) {
        self.inner.push_back(entry);
        while self.inner.len() > self.cap {
            self.inner.pop_front();
        }
    }

    /// Up to `n` most recent entries, oldest first.
    pub fn snapshot_last_n(&self, n: usize) -> Vec<PollSummary> {
        let start = self.inner.len().saturating_sub(n);
        self.inner.iter().skip(start).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 9, min, 0).unwrap()
    }

    #[test]
    fn ring_drops_oldest_past_capacity() {
        let mut h = History::default();
        for i in 0..12 {
            h.push(PollSummary {
                at: at(i),
                total: i as usize,
                fresh: 0,
            });
        }
        assert_eq!(h.len(), HISTORY_CAPACITY);
        let all = h.snapshot_last_n(100);
        assert_eq!(all.first().map(|s| s.total), Some(2));
        assert_eq!(all.last().map(|s| s.total), Some(11));
    }

    #[test]
    fn last_n_is_chronological() {
        let mut h = History::default();
        for i in 0..4 {
            h.push(PollSummary {
                at: at(i),
                total: 10 + i as usize,
                fresh: i as usize,
            });
        }
        let last = h.snapshot_last_n(3);
        let totals: Vec<_> = last.iter().map(|s| s.total).collect();
        assert_eq!(totals, vec![11, 12, 13]);
    }
}
