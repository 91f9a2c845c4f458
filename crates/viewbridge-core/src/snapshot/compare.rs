//! Comparison of normalized snapshot text.
//!
//! Both sides are normalized again before comparing.  That is safe because
//! normalization is idempotent, and it means callers can pass raw exporter
//! output on one side and a stored baseline on the other.

use std::fmt;

use serde_json::Value;

use crate::snapshot::normalize::Normalizer;
use crate::snapshot::{to_canonical_text, SnapshotError};

/// Default cap on the number of differing line pairs reported.
pub const DEFAULT_MAX_REPORTED_LINES: usize = 20;

/// Placeholder shown for a line that exists on only one side.
pub const MISSING_LINE: &str = "<missing>";

/// One differing line, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDifference {
    pub line: usize,
    /// `None` when the expected text has fewer lines.
    pub expected: Option<String>,
    /// `None` when the actual text has fewer lines.
    pub actual: Option<String>,
}

impl fmt::Display for LineDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Line {}: expected: {}",
            self.line,
            self.expected.as_deref().unwrap_or(MISSING_LINE)
        )?;
        write!(
            f,
            "Line {}: actual: {}",
            self.line,
            self.actual.as_deref().unwrap_or(MISSING_LINE)
        )
    }
}

/// The outcome of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub normalized_expected: String,
    /// On a match, this is the text to store as the new baseline.
    pub normalized_actual: String,
    /// At most `max_reported_lines` entries, in line order.
    pub differences: Vec<LineDifference>,
    /// Number of differing lines, including the ones not reported.
    pub total_differences: usize,
}

impl SnapshotDiff {
    pub fn is_match(&self) -> bool {
        self.total_differences == 0
    }

    /// Returns `true` when more lines differ than were reported.
    pub fn is_truncated(&self) -> bool {
        self.total_differences > self.differences.len()
    }

    /// Multi-line, human-readable description for assertion messages.
    pub fn summary(&self) -> String {
        if self.is_match() {
            return "no differences".to_string();
        }
        let mut out = String::new();
        for difference in &self.differences {
            out.push_str(&difference.to_string());
            out.push('\n');
        }
        out.push_str(&format!("{} line(s) differ", self.total_differences));
        if self.is_truncated() {
            out.push_str(&format!(" (showing first {})", self.differences.len()));
        }
        out
    }
}

/// Normalizes and compares two snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotComparer {
    normalizer: Normalizer,
    max_reported_lines: usize,
}

impl Default for SnapshotComparer {
    fn default() -> Self {
        Self::new(Normalizer::default(), DEFAULT_MAX_REPORTED_LINES)
    }
}

impl SnapshotComparer {
    pub fn new(normalizer: Normalizer, max_reported_lines: usize) -> Self {
        Self {
            normalizer,
            max_reported_lines,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Compares two JSON texts after normalizing both.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidJson`] if either side is not JSON.
    ///
    /// # Example
    ///
    /// ```rust
    /// use viewbridge_core::SnapshotComparer;
    ///
    /// let diff = SnapshotComparer::default()
    ///     .compare(r#"{"x": 0.1234565}"#, r#"{"x": 0.1234561}"#)
    ///     .unwrap();
    /// assert!(diff.is_match());
    /// ```
    pub fn compare(&self, expected: &str, actual: &str) -> Result<SnapshotDiff, SnapshotError> {
        let normalized_expected = self.normalizer.normalize_text(expected)?;
        let normalized_actual = self.normalizer.normalize_text(actual)?;
        Ok(self.diff(normalized_expected, normalized_actual))
    }

    /// Compares two JSON values after normalizing both.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Serialize`] if a value cannot be rendered.
    pub fn compare_values(
        &self,
        expected: &Value,
        actual: &Value,
    ) -> Result<SnapshotDiff, SnapshotError> {
        let normalized_expected = to_canonical_text(&self.normalizer.normalize_value(expected))?;
        let normalized_actual = to_canonical_text(&self.normalizer.normalize_value(actual))?;
        Ok(self.diff(normalized_expected, normalized_actual))
    }

    fn diff(&self, normalized_expected: String, normalized_actual: String) -> SnapshotDiff {
        if normalized_expected == normalized_actual {
            return SnapshotDiff {
                normalized_expected,
                normalized_actual,
                differences: Vec::new(),
                total_differences: 0,
            };
        }

        let expected_lines: Vec<&str> = normalized_expected.lines().collect();
        let actual_lines: Vec<&str> = normalized_actual.lines().collect();
        let line_count = expected_lines.len().max(actual_lines.len());

        let mut differences = Vec::new();
        let mut total_differences = 0;
        for index in 0..line_count {
            let expected = expected_lines.get(index).copied();
            let actual = actual_lines.get(index).copied();
            if expected == actual {
                continue;
            }
            total_differences += 1;
            if differences.len() < self.max_reported_lines {
                differences.push(LineDifference {
                    line: index + 1,
                    expected: expected.map(str::to_string),
                    actual: actual.map(str::to_string),
                });
            }
        }

        SnapshotDiff {
            normalized_expected,
            normalized_actual,
            differences,
            total_differences,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
