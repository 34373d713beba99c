// src/filter.rs
//! Inclusion filter and novelty diff over one poll's records.

use std::collections::HashSet;

use crate::catalog::ItemRecord;
use crate::identity::IdentityStore;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub models: Vec<String>,
    pub max_price: f64,
    pub market: String,
}

impl FilterConfig {
    pub fn new(models: Vec<String>, max_price: f64, market: String) -> Self {
        let models = models
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        Self {
            models,
            max_price,
            market,
        }
    }

    pub fn allows_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| m.eq_ignore_ascii_case(model.trim()))
    }

    /// Unlisted price passes; it is rendered as "not listed" downstream.
    pub fn allows_price(&self, price: Option<f64>) -> bool {
        match price {
            None => true,
            Some(p) => p <= self.max_price,
        }
    }

    pub fn matches(&self, item: &ItemRecord) -> bool {
        self.allows_model(&item.model) && self.allows_price(item.price)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    pub matched: Vec<ItemRecord>,
    pub fresh: Vec<ItemRecord>,
}

/// Split records into everything that passes the filter and the part of it worth alerting on.
///
/// On the first run the whole matched set is fresh. Afterwards only identities absent
/// from `identities` are. An identity repeated inside one response is fresh once.
pub fn classify(
    records: Vec<ItemRecord>,
    filter: &FilterConfig,
    identities: &IdentityStore,
    first_run: bool,
) -> Classified {
    let matched: Vec<ItemRecord> = records.into_iter().filter(|r| filter.matches(r)).collect();

    let mut seen_in_batch: HashSet<String> = HashSet::new();
    let fresh = matched
        .iter()
        .filter(|r| first_run || !identities.contains(&r.vin))
        .filter(|r| seen_in_batch.insert(r.vin.clone()))
        .cloned()
        .collect();

    Classified { matched, fresh }
}
