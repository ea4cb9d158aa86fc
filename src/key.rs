//! Key Derivation Module
//!
//! Deterministic cache key construction from text and compound filter
//! objects. Keys must be pure functions of their logical inputs: the same
//! query with the same filter set yields the same key regardless of the
//! order filter fields were written in, so filters are canonicalized
//! (recursive stable field ordering) before hashing.
//!
//! The hash is FNV-1a at 64-bit width, a simple non-cryptographic rolling
//! hash rendered as a compact hex string. Collisions are an accepted
//! tradeoff for a pure-optimization cache backed by a non-authoritative
//! store.

use serde_json::Value;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

// == Hashing ==
/// FNV-1a 64-bit rolling hash.
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hashes a string to a compact lowercase hex token.
pub fn hash_text(text: &str) -> String {
    format!("{:x}", fnv1a_64(text.as_bytes()))
}

// == Normalization ==
/// Normalizes free text before hashing: trimmed, lowercased, interior
/// whitespace collapsed to single spaces. Empty input normalizes to the
/// empty string and still produces a valid key.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Serializes a JSON value with recursively sorted object keys, so two
/// logically equal filter objects serialize identically.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let inner: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{}:{}", serde_json::to_string(k).unwrap_or_default(), canonical_json(v)))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", inner.join(","))
        }
        // Scalars already serialize deterministically
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

// == Derived Keys ==
/// Key for a cached embedding vector, derived from normalized input text.
pub fn embedding_key(text: &str) -> String {
    format!("emb:{}", hash_text(&normalize_text(text)))
}

/// Key for cached search results, composed from the search type, the
/// hashed query, and the hashed canonical filter object.
pub fn search_key(query: &str, search_type: &str, filters: &Value) -> String {
    format!(
        "search:{}:{}:{}",
        search_type,
        hash_text(&normalize_text(query)),
        hash_text(&canonical_json(filters)),
    )
}

/// Key for a cached user context payload.
pub fn user_context_key(user_id: &str) -> String {
    format!("user:{}:context", user_id)
}

/// Key for a memoized function call: function identity plus canonically
/// serialized arguments.
pub fn memo_key(fn_name: &str, args: &Value) -> String {
    format!("memo:{}:{}", fn_name, hash_text(&canonical_json(args)))
}
