// src/catalog/mod.rs
pub mod client;
pub mod query;
pub mod types;

pub use client::{parse_results_from_str, HttpCatalog};
pub use query::InventoryQuery;
pub use types::{CatalogSource, FetchError, ItemRecord};
