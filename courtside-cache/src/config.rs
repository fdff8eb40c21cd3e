//! Configuration for the cache engine.

use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Tunables for a [`Cache`](crate::Cache).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Client name, used in log output.
    pub client_name: String,
    /// Page number newly created pages start on.
    pub default_page: u64,
    /// Page size newly created pages start with.
    pub default_page_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            client_name: "courtside-client".to_string(),
            default_page: 0,
            default_page_size: 10,
        }
    }
}

impl CacheConfig {
    /// The argument map a fresh page is seeded with.
    #[must_use]
    pub fn default_page_args(&self) -> BTreeMap<String, Value> {
        let mut args = BTreeMap::new();
        args.insert("page".to_string(), json!(self.default_page));
        args.insert("size".to_string(), json!(self.default_page_size));
        args
    }
}
