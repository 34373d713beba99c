// src/identity.rs
//! Identities already notified on. Grows for the life of the process; nothing expires.

use serde::Serialize;
use std::collections::HashMap;

use crate::catalog::ItemRecord;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CachedEntry {
    pub vin: String,
    pub record: Option<ItemRecord>,
}

#[derive(Debug, Default)]
pub struct IdentityStore {
    order: Vec<String>,
    records: HashMap<String, Option<ItemRecord>>,
    retain_records: bool,
}

impl IdentityStore {
    pub fn new(retain_records: bool) -> Self {
        Self {
            order: Vec::new(),
            records: HashMap::new(),
            retain_records,
        }
    }

    pub fn contains(&self, vin: &str) -> bool {
        self.records.contains_key(vin)
    }

    /// Add identities not seen before. Returns how many were new.
    pub fn commit(&mut self, items: &[ItemRecord]) -> usize {
        let mut added = 0;
        for it in items {
            if self.records.contains_key(&it.vin) {
                continue;
            }
            let kept = self.retain_records.then(|| it.clone());
            self.records.insert(it.vin.clone(), kept);
            self.order.push(it.vin.clone());
            added += 1;
        }
        added
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Every entry in insertion order.
    pub fn entries(&self) -> Vec<CachedEntry> {
        self.order
            .iter()
            .map(|vin| CachedEntry {
                vin: vin.clone(),
                record: self.records.get(vin).cloned().flatten(),
            })
            .collect()
    }

    /// Full records kept for dumps, in insertion order. Empty when retention is off.
    pub fn retained(&self) -> Vec<ItemRecord> {
        self.order
            .iter()
            .filter_map(|vin| self.records.get(vin).cloned().flatten())
            .collect()
    }
}
