//! Harness configuration types.
//!
//! [`HarnessConfig`] is the single source of truth for runtime settings of the
//! bridge, the traffic recorder and the snapshot checks.  It is usually read
//! from a TOML file by [`crate::infrastructure::config_store`]:
//!
//! ```toml
//! [bridge]
//! request_timeout_ms = 5000
//!
//! [recorder]
//! sensitive_keys = ["token", "password"]
//!
//! [snapshot]
//! decimal_places = 6
//! max_reported_lines = 20
//! baseline_dir = "tests/snapshots"
//! update_baselines = false
//! ```
//!
//! Every field has a serde default, so a partial file (or an empty one) still
//! yields a complete configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use viewbridge_core::{NormalizeOptions, Normalizer, SnapshotComparer};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    #[serde(default)]
    pub bridge: BridgeSettings,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub snapshot: SnapshotSettings,
}

/// Settings for [`crate::application::Bridge`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeSettings {
    /// Budget used by [`crate::application::Bridge::request`].
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl BridgeSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Settings for the traffic recorder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecorderConfig {
    /// Object keys whose values are replaced with `"[REDACTED]"` in recorded
    /// payloads.  Matching ignores ASCII case.
    #[serde(default = "default_sensitive_keys")]
    pub sensitive_keys: Vec<String>,
}

impl RecorderConfig {
    /// Returns `true` if `key` names a sensitive field.
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.sensitive_keys
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(key))
    }
}

/// Settings for snapshot normalization and baseline checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotSettings {
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Cap on differing line pairs listed in a mismatch report.
    #[serde(default = "default_max_reported_lines")]
    pub max_reported_lines: usize,
    /// Directory holding `<name>.json` baseline files.
    #[serde(default = "default_baseline_dir")]
    pub baseline_dir: PathBuf,
    /// When `true`, baselines are overwritten instead of checked.
    #[serde(default)]
    pub update_baselines: bool,
}

impl SnapshotSettings {
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            decimal_places: self.decimal_places,
        }
    }

    /// Builds a comparer honouring these settings.
    pub fn comparer(&self) -> SnapshotComparer {
        SnapshotComparer::new(
            Normalizer::new(self.normalize_options()),
            self.max_reported_lines,
        )
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

/// Keys redacted when no configuration says otherwise.
pub const DEFAULT_SENSITIVE_KEYS: &[&str] = &[
    "token",
    "accessToken",
    "refreshToken",
    "password",
    "secret",
    "apiKey",
    "credentials",
];

fn default_request_timeout_ms() -> u64 {
    5000
}
fn default_sensitive_keys() -> Vec<String> {
    DEFAULT_SENSITIVE_KEYS.iter().map(|k| k.to_string()).collect()
}
fn default_decimal_places() -> u32 {
    viewbridge_core::snapshot::normalize::DEFAULT_DECIMAL_PLACES
}
fn default_max_reported_lines() -> usize {
    viewbridge_core::snapshot::compare::DEFAULT_MAX_REPORTED_LINES
}
fn default_baseline_dir() -> PathBuf {
    PathBuf::from("tests/snapshots")
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sensitive_keys: default_sensitive_keys(),
        }
    }
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            decimal_places: default_decimal_places(),
            max_reported_lines: default_max_reported_lines(),
            baseline_dir: default_baseline_dir(),
            update_baselines: false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
