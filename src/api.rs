// src/api.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::history::PollSummary;
use crate::identity::CachedEntry;
use crate::scheduler::Watcher;

#[derive(Clone)]
pub struct AppState {
    pub watcher: Arc<Watcher>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/cached", get(cached))
        .route("/history", get(history))
        .route("/telegram/webhook", post(telegram_webhook))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn cached(State(state): State<AppState>) -> Json<Vec<CachedEntry>> {
    Json(state.watcher.cached_entries().await)
}

async fn history(State(state): State<AppState>) -> Json<Vec<PollSummary>> {
    let st = state.watcher.state();
    let rows = st.lock().await.history.snapshot_last_n(usize::MAX);
    Json(rows)
}

// --- Telegram update, only the parts we read ---

#[derive(Debug, Deserialize)]
struct Update {
    #[serde(default)]
    message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cached,
    Status,
}

/// `/cached` and `/cached@SomeBot` both count; anything else is ignored.
pub fn parse_command(text: &str) -> Option<Command> {
    let first = text.split_whitespace().next()?;
    let name = first.split('@').next().unwrap_or(first);
    match name.to_ascii_lowercase().as_str() {
        "/cached" => Some(Command::Cached),
        "/status" => Some(Command::Status),
        _ => None,
    }
}

/// Always answers 200 so Telegram does not redeliver; bodies we cannot read are ignored.
async fn telegram_webhook(State(state): State<AppState>, body: Bytes) -> &'static str {
    let Some(msg) = serde_json::from_slice::<Update>(&body)
        .ok()
        .and_then(|u| u.message)
    else {
        tracing::debug!(target: "watch", "webhook: no message, ignored");
        return "ok";
    };

    let chat_id = msg.chat.id.to_string();
    let Some(cmd) = msg.text.as_deref().and_then(parse_command) else {
        return "ok";
    };
    tracing::info!(target: "watch", chat_id = %chat_id, ?cmd, "webhook command");

    let replies = match cmd {
        Command::Cached => state.watcher.cached_dump().await,
        Command::Status => vec![state.watcher.digest_text().await],
    };
    for text in &replies {
        state.watcher.say_to(&chat_id, text).await;
    }
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognized_with_bot_suffix_and_args() {
        assert_eq!(parse_command("/cached"), Some(Command::Cached));
        assert_eq!(parse_command("  /cached@WatchBot now"), Some(Command::Cached));
        assert_eq!(parse_command("/STATUS"), Some(Command::Status));
        assert_eq!(parse_command("cached"), None);
        assert_eq!(parse_command(""), None);
    }
}
