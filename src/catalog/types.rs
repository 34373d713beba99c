// src/catalog/types.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One inventory listing as returned by the catalog, normalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRecord {
    pub vin: String,
    pub model: String,
    pub year: i32,
    pub price: Option<f64>,
    pub odometer: Option<f64>,
    pub city: String,
    pub state_province: String,
    pub added_date: Option<String>, // as sent by the catalog, never parsed
}

/// Why a poll produced no records. Never carries partial data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("catalog returned HTTP {0}")]
    Status(u16),
    #[error("catalog request timed out")]
    Timeout,
    #[error("catalog request failed: {0}")]
    Transport(String),
    #[error("catalog response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<ItemRecord>, FetchError>;
    fn name(&self) -> &'static str;
}
