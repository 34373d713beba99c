// src/notify/telegram.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{Notifier, NotifyError};

/// Bot credentials. Both come from the environment, never from the config file.
#[derive(Debug, Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramCredentials {
    /// Reads `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`. `None` if either is missing or blank.
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?;
        if bot_token.trim().is_empty() || chat_id.trim().is_empty() {
            return None;
        }
        Some(Self {
            bot_token: bot_token.trim().to_string(),
            chat_id: chat_id.trim().to_string(),
        })
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Clone)]
pub struct TelegramNotifier {
    api_base: String,
    creds: TelegramCredentials,
    client: Client,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(creds: TelegramCredentials) -> Self {
        Self {
            api_base: "https://api.telegram.org".into(),
            creds,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.creds.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// One attempt, no retry.
    async fn send_to(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let payload = SendMessage { chat_id, text };
        self.client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn default_chat(&self) -> &str {
        &self.creds.chat_id
    }
}
