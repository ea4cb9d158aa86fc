//! Error types for the caching layer
//!
//! Provides unified error handling using thiserror.
//!
//! A cache miss is not an error: read paths return `Option` and reserve
//! `CacheError` for genuine failures (oversized keys, serialization,
//! fetch functions that fail).

use thiserror::Error;

use crate::cache::MAX_KEY_LENGTH;

// == Cache Error Enum ==
/// Unified error type for the caching layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key exceeds the maximum allowed length
    #[error("key exceeds maximum length of {max} bytes: {0} bytes", max = MAX_KEY_LENGTH)]
    KeyTooLong(usize),

    /// Value could not be serialized or deserialized for storage
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A caller-supplied fetch function failed; the source error is
    /// propagated unchanged, with the key attached for context
    #[error("fetch failed for key '{key}'")]
    Fetch {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CacheError {
    /// Wraps a fetch function failure with the key it was fetching.
    pub fn fetch(key: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Fetch {
            key: key.into(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching layer.
pub type Result<T> = std::result::Result<T, CacheError>;
