//! Hashing - SHA-256 Fingerprints
//!
//! Section sources are fingerprinted so unchanged schemas are not re-parsed.
//! Rendered pages are hashed over canonical JSON so equal pages hash equally
//! regardless of map iteration order.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Lowercase hex SHA-256 over `parts`, each followed by a NUL separator.
fn digest_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
        hasher.update([0u8]);
    }
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

/// Fingerprint of a section source, keyed by its section type.
pub fn fingerprint_source(section_type: &str, source: &str) -> String {
    digest_parts([section_type.as_bytes(), source.as_bytes()])
}

/// Fingerprint of a composed page (or any serializable output).
pub fn page_hash<T: Serialize>(page: &T) -> Result<String> {
    let canonical = canonical_json(page)?;
    Ok(digest_parts([canonical.as_bytes()]))
}

/// Compact JSON with object keys in byte order at every depth.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let mut value = serde_json::to_value(value)?;
    sort_keys(&mut value);
    Ok(serde_json::to_string(&value)?)
}

fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            for (key, mut child) in entries {
                sort_keys(&mut child);
                map.insert(key, child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}
