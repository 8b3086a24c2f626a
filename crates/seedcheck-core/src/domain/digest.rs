//! Deterministic JSON serialization and SHA-256 fingerprints.
//!
//! Object keys are emitted in code-point order at every depth; array order
//! and number spelling are kept as-is, so `1` and `1.0` hash differently.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::error::Result;

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            let mut sorted = Map::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), sort_keys(v));
                }
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Compact JSON with sorted keys.
pub fn canonical_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(&sort_keys(value))?)
}

/// SHA-256 hex digest of [`canonical_json`].
pub fn compute_digest(value: &Value) -> Result<String> {
    let canonical = canonical_json(value)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
