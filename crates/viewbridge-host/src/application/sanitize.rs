//! Redaction of sensitive fields in recorded payloads.

use serde_json::{Map, Value};

use crate::domain::RecorderConfig;

/// Replacement text for a redacted value.
pub const REDACTED: &str = "[REDACTED]";

/// Returns a copy of `value` with every sensitive field's value replaced by
/// [`REDACTED`], at any depth.
///
/// A sensitive key is redacted whatever its value is, including objects and
/// arrays.  All other keys and every array element are kept and sanitized
/// recursively.  `value` itself is not modified.
pub fn sanitize(value: &Value, config: &RecorderConfig) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| {
                    let child = if config.is_sensitive(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        sanitize(child, config)
                    };
                    (key.clone(), child)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| sanitize(item, config)).collect())
        }
        scalar => scalar.clone(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
