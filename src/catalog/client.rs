// src/catalog/client.rs
use async_trait::async_trait;
use metrics::histogram;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;

use crate::catalog::query::InventoryQuery;
use crate::catalog::types::{CatalogSource, FetchError, ItemRecord};
use crate::config::WatchConfig;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

#[derive(Debug, Deserialize)]
struct InventoryResponse {
    results: Results,
}

// The catalog answers a search with no direct hits with an object instead of a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Results {
    List(Vec<RawItem>),
    Split {
        #[serde(default)]
        exact: Vec<RawItem>,
    },
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(rename = "VIN")]
    vin: String,
    #[serde(rename = "Model", default)]
    model: String,
    #[serde(rename = "Year", default)]
    year: i32,
    #[serde(rename = "PurchasePrice", default)]
    purchase_price: Option<f64>,
    #[serde(rename = "Odometer", default)]
    odometer: Option<f64>,
    #[serde(rename = "City", default)]
    city: Option<String>,
    #[serde(rename = "StateProvince", default)]
    state_province: Option<String>,
    #[serde(rename = "AddedDate", default)]
    added_date: Option<String>,
}

impl From<RawItem> for ItemRecord {
    fn from(r: RawItem) -> Self {
        ItemRecord {
            vin: r.vin,
            model: r.model,
            year: r.year,
            price: r.purchase_price,
            odometer: r.odometer,
            city: r.city.unwrap_or_default(),
            state_province: r.state_province.unwrap_or_default(),
            added_date: r.added_date,
        }
    }
}

/// Decode a catalog response body. All-or-nothing: one malformed entry fails the poll.
pub fn parse_results_from_str(body: &str) -> Result<Vec<ItemRecord>, FetchError> {
    let resp: InventoryResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let raw = match resp.results {
        Results::List(v) => v,
        Results::Split { exact } => exact,
    };
    Ok(raw.into_iter().map(ItemRecord::from).collect())
}

pub struct HttpCatalog {
    url: String,
    query: InventoryQuery,
    client: Client,
    timeout: Duration,
}

impl HttpCatalog {
    pub fn new(cfg: &WatchConfig) -> Self {
        Self {
            url: cfg.catalog_url.clone(),
            query: InventoryQuery::from_config(cfg),
            client: Client::new(),
            timeout: cfg.fetch_timeout(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn query(&self) -> &InventoryQuery {
        &self.query
    }

    async fn request(&self) -> Result<Vec<ItemRecord>, FetchError> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[("query", self.query.to_json())])
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json, text/plain, */*")
            .header(header::REFERER, self.query.referer())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        parse_results_from_str(&body)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch_latest(&self) -> Result<Vec<ItemRecord>, FetchError> {
        let t0 = std::time::Instant::now();
        let result = self.request().await;

        histogram!("watch_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        match &result {
            Ok(items) => {
                tracing::debug!(target: "watch", count = items.len(), "catalog fetched");
            }
            Err(e) => {
                tracing::warn!(target: "watch", error = %e, provider = self.name(), "catalog fetch failed");
            }
        }
        result
    }

    fn name(&self) -> &'static str {
        "tesla-inventory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_results_with_nullable_fields() {
        let body = r#"{"results":[
            {"VIN":"5YJ3E1EA1NF000001","Model":"Model 3","Year":2022,"PurchasePrice":29900,
             "Odometer":18250,"City":"Austin","StateProvince":"TX","AddedDate":"2025-09-01T10:00:00"},
            {"VIN":"7SAYGDEE5PF000002","Model":"Model Y","Year":2023,"PurchasePrice":null,
             "City":"Fremont","StateProvince":"CA"}
        ]}"#;
        let items = parse_results_from_str(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].price, Some(29_900.0));
        assert_eq!(items[0].odometer, Some(18_250.0));
        assert_eq!(items[1].price, None);
        assert_eq!(items[1].odometer, None);
        assert_eq!(items[1].added_date, None);
        assert_eq!(items[1].city, "Fremont");
    }

    #[test]
    fn parses_split_results_using_exact_matches() {
        let body = r#"{"results":{"exact":[],"approximate":[{"VIN":"X","Model":"Model X","Year":2020}]}}"#;
        let items = parse_results_from_str(body).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        let err = parse_results_from_str("<html>blocked</html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
