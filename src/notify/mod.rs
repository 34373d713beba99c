// src/notify/mod.rs
pub mod format;
pub mod telegram;

use async_trait::async_trait;
use metrics::counter;
use std::sync::Mutex;
use thiserror::Error;

pub use telegram::{TelegramCredentials, TelegramNotifier};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("channel returned HTTP {0}")]
    Status(u16),
    #[error("channel request timed out")]
    Timeout,
    #[error("channel request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NotifyError::Timeout
        } else if let Some(status) = e.status() {
            NotifyError::Status(status.as_u16())
        } else {
            NotifyError::Transport(e.to_string())
        }
    }
}

/// Outbound text channel. Delivery is best-effort; callers go through [`deliver`].
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_to(&self, chat_id: &str, text: &str) -> Result<(), NotifyError>;

    /// Destination for alerts, heartbeats and digests.
    fn default_chat(&self) -> &str;

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.send_to(self.default_chat(), text).await
    }
}

/// Send to the default chat, log a failure and carry on. Returns whether it went out.
pub async fn deliver(notifier: &dyn Notifier, text: &str) -> bool {
    deliver_to(notifier, notifier.default_chat(), text).await
}

pub async fn deliver_to(notifier: &dyn Notifier, chat_id: &str, text: &str) -> bool {
    match notifier.send_to(chat_id, text).await {
        Ok(()) => {
            tracing::debug!(target: "watch", chat_id, "message sent");
            true
        }
        Err(e) => {
            tracing::warn!(target: "watch", error = %e, chat_id, "notification failed");
            counter!("watch_notify_failures_total").increment(1);
            false
        }
    }
}

/// Stand-in when no bot credentials are configured: messages only reach the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_to(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        tracing::info!(target: "watch", chat_id, %text, "telegram disabled, message logged");
        Ok(())
    }

    fn default_chat(&self) -> &str {
        "log"
    }
}

// --- Test helper ---
/// Captures every message; optionally fails every send.
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
    chat: String,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(vec![]),
            fail: false,
            chat: "test-chat".into(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Texts only, in send order.
    pub fn texts(&self) -> Vec<String> {
        match self.sent.lock() {
            Ok(v) => v.iter().map(|(_, t)| t.clone()).collect(),
            Err(poison) => poison.into_inner().iter().map(|(_, t)| t.clone()).collect(),
        }
    }

    pub fn sent_to(&self) -> Vec<(String, String)> {
        match self.sent.lock() {
            Ok(v) => v.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_to(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        // Attempts are recorded even when they "fail".
        if let Ok(mut v) = self.sent.lock() {
            v.push((chat_id.to_string(), text.to_string()));
        }
        if self.fail {
            return Err(NotifyError::Status(502));
        }
        Ok(())
    }

    fn default_chat(&self) -> &str {
        &self.chat
    }
}
