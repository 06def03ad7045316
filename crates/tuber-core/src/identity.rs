//! Content-derived identifiers.
//!
//! Records are keyed by a short hex digest of their identity fields so that
//! importing the same track or playlist twice always lands on the same id.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::models::{Arguments, PlaylistType, Provider};

const ID_LENGTH: usize = 7;

pub fn track_id(artist: &str, name: &str) -> String {
    identity_hash(&json!({
        "artist": artist.trim().to_lowercase(),
        "name": name.trim().to_lowercase(),
    }))
}

pub fn playlist_id(
    kind: PlaylistType,
    provider: Provider,
    arguments: &Arguments,
    limit: u32,
) -> String {
    identity_hash(&json!({
        "type": kind,
        "provider": provider,
        "arguments": arguments,
        "limit": limit,
    }))
}

pub fn identity_hash(fields: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(fields, &mut canonical);
    let digest = format!("{:x}", Sha256::digest(canonical.as_bytes()));
    digest[..ID_LENGTH].to_string()
}

// Object keys are emitted sorted so the digest never depends on insertion order.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort();
            out.push('{');
            for (index, key) in keys.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
