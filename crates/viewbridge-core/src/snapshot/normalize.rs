//! The permissive snapshot normalizer.
//!
//! Accepts any JSON tree and rebuilds it according to three rules:
//!
//! 1. **Numbers** – floating-point leaves are rounded to
//!    [`NormalizeOptions::decimal_places`] (ties away from zero); integers are
//!    left untouched.
//! 2. **Identifiers** – properties named `id` (any letter case) are dropped.
//! 3. **Ordering** – an array whose elements are all objects, and where every
//!    element carries a `name` or every element carries a `referencePath`, is
//!    stably sorted by `(name, referencePath)`.  Other arrays keep their order
//!    because their position is meaningful (e.g. the 13 coefficients of a
//!    component transform).
//!
//! Object keys keep their first-seen order.  The input is never mutated; every
//! call returns a freshly built tree.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::snapshot::rounding::round_half_away_from_zero;
use crate::snapshot::{parse_text, to_canonical_text, SnapshotError};

/// Default number of decimal places kept for floating-point leaves.
pub const DEFAULT_DECIMAL_PLACES: u32 = 6;

/// Property whose value is a component's display name.
pub const NAME_KEY: &str = "name";

/// Property whose value is a component's source document path.
pub const REFERENCE_PATH_KEY: &str = "referencePath";

/// Tuning knobs for [`Normalizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Decimal places kept for floating-point leaves.
    pub decimal_places: u32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            decimal_places: DEFAULT_DECIMAL_PLACES,
        }
    }
}

/// Canonicalizes arbitrary JSON trees.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use viewbridge_core::Normalizer;
///
/// let n = Normalizer::default();
/// let out = n.normalize_value(&json!({"id": 7, "children": [{"name": "B"}, {"name": "A"}]}));
/// assert_eq!(out, json!({"children": [{"name": "A"}, {"name": "B"}]}));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    /// Creates a normalizer with the given options.
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Returns the options this normalizer was built with.
    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    /// Returns the canonical form of `value` as a new tree.
    pub fn normalize_value(&self, value: &Value) -> Value {
        match value {
            Value::Number(n) => Value::Number(self.normalize_number(n)),
            Value::Array(items) => {
                let items = items.iter().map(|item| self.normalize_value(item)).collect();
                Value::Array(order_by_identity(items))
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(key, _)| !is_identifier_key(key))
                    .map(|(key, child)| (key.clone(), self.normalize_value(child)))
                    .collect::<Map<String, Value>>(),
            ),
            Value::Null | Value::Bool(_) | Value::String(_) => value.clone(),
        }
    }

    /// Parses `text`, normalizes it and renders canonical text.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidJson`] if `text` is not JSON.
    pub fn normalize_text(&self, text: &str) -> Result<String, SnapshotError> {
        let value = parse_text(text)?;
        to_canonical_text(&self.normalize_value(&value))
    }

    /// Serializes `model` to JSON, normalizes it and renders canonical text.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Serialize`] if `model` cannot be represented
    /// as JSON (e.g. a map with non-string keys).
    pub fn normalize<T: Serialize + ?Sized>(&self, model: &T) -> Result<String, SnapshotError> {
        let value = serde_json::to_value(model).map_err(SnapshotError::Serialize)?;
        to_canonical_text(&self.normalize_value(&value))
    }

    pub(crate) fn normalize_number(&self, number: &Number) -> Number {
        match number.as_f64() {
            Some(float) if number.is_f64() => {
                let rounded = round_half_away_from_zero(float, self.options.decimal_places);
                Number::from_f64(rounded).unwrap_or_else(|| number.clone())
            }
            _ => number.clone(),
        }
    }
}

/// Returns `true` for property names that carry run-specific identifiers.
///
/// Matching ignores ASCII case, so `id`, `Id` and `ID` are all dropped.
pub fn is_identifier_key(key: &str) -> bool {
    key.eq_ignore_ascii_case("id")
}

/// Sorts an array of objects by `(name, referencePath)` when it has them.
///
/// The array is left alone unless it is non-empty, every element is an object,
/// and either every element has a `name` or every element has a
/// `referencePath`.  A missing field sorts as the empty string.  Comparison is
/// ordinal (byte-wise) and the sort is stable, so duplicates keep their input
/// order.
pub(crate) fn order_by_identity(items: Vec<Value>) -> Vec<Value> {
    if items.is_empty() || !items.iter().all(Value::is_object) {
        return items;
    }
    let all_have = |key: &str| items.iter().all(|item| item.get(key).is_some());
    if !all_have(NAME_KEY) && !all_have(REFERENCE_PATH_KEY) {
        return items;
    }

    let mut keyed: Vec<((String, String), Value)> = items
        .into_iter()
        .map(|item| {
            let key = (
                sort_field(&item, NAME_KEY),
                sort_field(&item, REFERENCE_PATH_KEY),
            );
            (key, item)
        })
        .collect();
    // `sort_by` is stable: equal keys keep their original relative order.
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, item)| item).collect()
}

fn sort_field(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
