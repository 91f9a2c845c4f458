//! Snapshot canonicalization and comparison.
//!
//! # Why normalize at all? (for beginners)
//!
//! A regression test for the assembly export wants to say "the tree we
//! produced today is the same as the tree we approved last week".  Comparing
//! the raw JSON text fails for reasons that have nothing to do with the model:
//!
//! - The CAD API enumerates child components in an unspecified order.
//! - Transform coefficients come back as `0.30000000000000004` one day and
//!   `0.3` the next.
//! - Every export assigns fresh `id` values.
//!
//! The normalizer rewrites a tree so that all three differences disappear, and
//! the comparer then does a plain string compare on the result.  Because the
//! rewrite is idempotent, already-normalized baselines can be passed through
//! it again without changing.
//!
//! # Modules
//!
//! - [`rounding`] – exact round-half-away-from-zero on `f64`.
//! - [`normalize`] – the permissive normalizer (any JSON tree).
//! - [`schema`] – the strict normalizer that validates against a [`schema::Schema`].
//! - [`compare`] – line-oriented diffing of normalized text.

pub mod compare;
pub mod normalize;
pub mod rounding;
pub mod schema;

use serde_json::Value;
use thiserror::Error;

use crate::snapshot::schema::SchemaViolations;

/// Errors produced by the snapshot engine.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The input text could not be parsed as JSON.
    #[error("snapshot input is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// A model could not be converted to or from JSON.
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The strict normalizer found one or more schema violations.
    #[error(transparent)]
    Schema(#[from] SchemaViolations),
}

/// Renders a normalized tree as deterministic, two-space indented JSON.
///
/// `serde_json` formats numbers without consulting the locale, so the output is
/// identical on every machine.
///
/// # Errors
///
/// Returns [`SnapshotError::Serialize`] if the value cannot be written.
pub fn to_canonical_text(value: &Value) -> Result<String, SnapshotError> {
    serde_json::to_string_pretty(value).map_err(SnapshotError::Serialize)
}

/// Parses snapshot text into a JSON value.
pub(crate) fn parse_text(text: &str) -> Result<Value, SnapshotError> {
    serde_json::from_str(text).map_err(SnapshotError::InvalidJson)
}
