//! Cached value payloads
//!
//! Value objects stored in the dedicated tiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload stored in the search-results tier: the results themselves plus
/// the timestamp and the original query/type/filters they were produced
/// from, so consumers can judge staleness and provenance without a second
/// lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSearchResults {
    /// The search results, opaque to the cache
    pub results: Vec<Value>,
    /// When the results were cached
    pub timestamp: DateTime<Utc>,
    /// The original query text
    pub query: String,
    /// The search type ("board", "asset", ...)
    #[serde(rename = "type")]
    pub search_type: String,
    /// The original filter object
    pub filters: Value,
}

impl CachedSearchResults {
    /// Creates a payload stamped with the current time.
    pub fn new(query: impl Into<String>, search_type: impl Into<String>, filters: Value, results: Vec<Value>) -> Self {
        Self {
            results,
            timestamp: Utc::now(),
            query: query.into(),
            search_type: search_type.into(),
            filters,
        }
    }
}
