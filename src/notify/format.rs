// src/notify/format.rs
//! Plain-text rendering of every outbound message.

use chrono::{DateTime, Utc};

use crate::catalog::{FetchError, ItemRecord};
use crate::config::WatchConfig;
use crate::history::PollSummary;

/// Telegram rejects longer `sendMessage` texts.
pub const MAX_MESSAGE_CHARS: usize = 4096;

pub const PRICE_NOT_LISTED: &str = "not listed";

fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Whole units with thousands separators: 29900.4 -> "29,900".
pub fn fmt_thousands(v: f64) -> String {
    let n = v.round() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

pub fn fmt_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${}", fmt_thousands(p)),
        None => PRICE_NOT_LISTED.to_string(),
    }
}

pub fn listing_url(base: &str, vin: &str) -> String {
    format!("{base}{vin}")
}

pub fn item_block(item: &ItemRecord, listing_base: &str) -> String {
    let mileage = item
        .odometer
        .map(|m| format!("{} mi", fmt_thousands(m)))
        .unwrap_or_else(|| "unknown".into());
    format!(
        "{} {}\nPrice: {}\nMileage: {}\nLocation: {}, {}\nVIN: {}\nAdded: {}\n🔗 {}",
        item.year,
        item.model,
        fmt_price(item.price),
        mileage,
        item.city,
        item.state_province,
        item.vin,
        item.added_date.as_deref().unwrap_or("unknown"),
        listing_url(listing_base, &item.vin)
    )
}

/// Cut `s` to at most `max` characters, marking the cut with an ellipsis.
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Glue blocks under a header, starting a new message whenever the next block would
/// push past `limit` characters. A block that could not fit under the header even on
/// its own is clipped first, so no message exceeds `limit`.
pub fn pack_blocks(header: &str, blocks: &[String], limit: usize) -> Vec<String> {
    let budget = limit.saturating_sub(header.chars().count() + 2);
    let mut out = Vec::new();
    let mut cur = header.to_string();
    for b in blocks {
        let b = clip(b, budget);
        let extra = b.chars().count() + 2;
        if !cur.is_empty() && cur.chars().count() + extra > limit {
            out.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push_str("\n\n");
        }
        cur.push_str(&b);
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

/// One batch for all fresh items; split only to respect the channel length limit.
pub fn fresh_items_messages(items: &[ItemRecord], listing_base: &str) -> Vec<String> {
    if items.is_empty() {
        return Vec::new();
    }
    let header = format!("🚗 New listings: {}", items.len());
    let blocks: Vec<String> = items.iter().map(|i| item_block(i, listing_base)).collect();
    pack_blocks(&header, &blocks, MAX_MESSAGE_CHARS)
}

pub fn heartbeat_message(now: DateTime<Utc>) -> String {
    format!("🟢 Checked, nothing new since the last report ({})", fmt_ts(now))
}

pub fn error_alert_message(err: &FetchError, consecutive: u32) -> String {
    format!("⚠️ Catalog fetch failed ({consecutive} in a row): {err}")
}

pub fn recovery_message(failures: u32) -> String {
    format!("✅ Catalog reachable again after {failures} failed attempt(s)")
}

pub fn digest_message(cfg: &WatchConfig, recent: &[PollSummary]) -> String {
    let mut out = format!(
        "📊 Watch digest\nInterval: {}s ± {}s\nRegion: {}\nModels: {}\nMax price: ${}\nRecent polls:",
        cfg.check_interval_secs,
        cfg.jitter_secs,
        cfg.market,
        cfg.models.join(", "),
        fmt_thousands(cfg.max_price)
    );
    if recent.is_empty() {
        out.push_str("\n• none yet");
    }
    for s in recent {
        out.push_str(&format!(
            "\n• {}: total {}, new {}",
            fmt_ts(s.at),
            s.total,
            s.fresh
        ));
    }
    out
}

pub fn cached_dump_messages(items: &[ItemRecord]) -> Vec<String> {
    if items.is_empty() {
        return vec!["Cache is empty".to_string()];
    }
    let header = format!("📦 Cached listings: {}", items.len());
    let lines: Vec<String> = items
        .iter()
        .map(|i| format!("{} {} · {} · {}", i.year, i.model, fmt_price(i.price), i.vin))
        .collect();
    pack_blocks(&header, &lines, MAX_MESSAGE_CHARS)
}
