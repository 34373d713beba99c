// src/catalog/query.rs
//! Inventory search query as the catalog expects it: a JSON object passed
//! URL-encoded in the `query` parameter.

use serde::Serialize;

use crate::config::WatchConfig;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InventoryQuery {
    pub query: QueryFilter,
    pub offset: u32,
    pub count: u32,
    #[serde(rename = "outsideOffset")]
    pub outside_offset: u32,
    #[serde(rename = "outsideSearch")]
    pub outside_search: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryFilter {
    pub model: Vec<String>,
    pub condition: String,
    pub arrangeby: String,
    pub order: String,
    pub market: String,
    pub price: f64,
}

impl InventoryQuery {
    /// Always the first page: offset 0, `page_size` results.
    pub fn from_config(cfg: &WatchConfig) -> Self {
        Self {
            query: QueryFilter {
                model: cfg.models.clone(),
                condition: cfg.condition.clone(),
                arrangeby: "Relevance".into(),
                order: "desc".into(),
                market: cfg.market.clone(),
                price: cfg.max_price,
            },
            offset: 0,
            count: cfg.page_size,
            outside_offset: 0,
            outside_search: false,
        }
    }

    pub fn to_json(&self) -> String {
        // Plain strings/numbers only; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Referer the catalog's own UI would send for this search.
    pub fn referer(&self) -> String {
        let slug = self
            .query
            .model
            .first()
            .map(|m| m.to_ascii_lowercase().replace(' ', ""))
            .unwrap_or_default();
        format!("https://www.tesla.com/inventory/{}/{}", self.query.condition, slug)
    }
}
