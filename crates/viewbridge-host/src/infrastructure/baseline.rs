//! Named snapshot baselines on disk.
//!
//! Each baseline is `<dir>/<name>.json` holding normalized snapshot text.
//! [`BaselineStore::verify`] writes the file on first use (or when updating)
//! and otherwise compares against it.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use viewbridge_core::{SnapshotComparer, SnapshotDiff, SnapshotError};

use crate::domain::SnapshotSettings;

#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("I/O error accessing baseline at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Result of [`BaselineStore::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaselineOutcome {
    /// No baseline existed; one was written.
    Created(PathBuf),
    /// Update mode; the baseline was overwritten.
    Updated(PathBuf),
    Matched,
    Mismatched(SnapshotDiff),
}

impl BaselineOutcome {
    /// `false` only for [`BaselineOutcome::Mismatched`].
    pub fn is_pass(&self) -> bool {
        !matches!(self, BaselineOutcome::Mismatched(_))
    }
}

pub struct BaselineStore {
    dir: PathBuf,
    comparer: SnapshotComparer,
    update: bool,
}

impl BaselineStore {
    pub fn new(dir: impl Into<PathBuf>, comparer: SnapshotComparer, update: bool) -> Self {
        Self {
            dir: dir.into(),
            comparer,
            update,
        }
    }

    pub fn from_settings(settings: &SnapshotSettings) -> Self {
        Self::new(
            settings.baseline_dir.clone(),
            settings.comparer(),
            settings.update_baselines,
        )
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Checks `actual` (raw JSON text) against the baseline called `name`.
    ///
    /// # Errors
    ///
    /// [`BaselineError::Snapshot`] if either side is not JSON, or
    /// [`BaselineError::Io`] if the baseline cannot be read or written.
    pub fn verify(&self, name: &str, actual: &str) -> Result<BaselineOutcome, BaselineError> {
        let path = self.path_for(name);

        if self.update || !path.exists() {
            let normalized = self.comparer.normalizer().normalize_text(actual)?;
            write_baseline(&path, &normalized)?;
            return Ok(if self.update {
                info!(baseline = %path.display(), "baseline updated");
                BaselineOutcome::Updated(path)
            } else {
                info!(baseline = %path.display(), "baseline created");
                BaselineOutcome::Created(path)
            });
        }

        let expected = std::fs::read_to_string(&path).map_err(|source| BaselineError::Io {
            path: path.clone(),
            source,
        })?;
        let diff = self.comparer.compare(&expected, actual)?;
        if diff.is_match() {
            Ok(BaselineOutcome::Matched)
        } else {
            warn!(
                baseline = %path.display(),
                differences = diff.total_differences,
                "snapshot differs from baseline"
            );
            Ok(BaselineOutcome::Mismatched(diff))
        }
    }
}

fn write_baseline(path: &Path, text: &str) -> Result<(), BaselineError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| BaselineError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, text).map_err(|source| BaselineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store(dir: &Path, update: bool) -> BaselineStore {
        BaselineStore::new(dir.join("snapshots"), SnapshotComparer::default(), update)
    }

    #[test]
    fn test_first_verify_creates_normalized_baseline() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), false);

        // Act
        let outcome = store.verify("tree", r#"{"id": 5, "mass": 1.23456789}"#).unwrap();

        // Assert
        let path = store.path_for("tree");
        assert_eq!(outcome, BaselineOutcome::Created(path.clone()));
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "{\n  \"mass\": 1.234568\n}"
        );
    }

    #[test]
    fn test_equivalent_snapshot_matches() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), false);
        store
            .verify("tree", r#"{"children": [{"name": "b"}, {"name": "a"}]}"#)
            .unwrap();

        let outcome = store
            .verify("tree", r#"{"children": [{"name": "a", "id": 1}, {"name": "b"}]}"#)
            .unwrap();

        assert_eq!(outcome, BaselineOutcome::Matched);
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_changed_snapshot_reports_diff() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), false);
        store.verify("tree", r#"{"mass": 1.0}"#).unwrap();

        let outcome = store.verify("tree", r#"{"mass": 2.0}"#).unwrap();

        let BaselineOutcome::Mismatched(diff) = outcome else {
            panic!("expected a mismatch");
        };
        assert_eq!(diff.total_differences, 1);
    }

    #[test]
    fn test_update_mode_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        store(dir.path(), false).verify("tree", r#"{"mass": 1.0}"#).unwrap();
        let updating = store(dir.path(), true);

        let outcome = updating.verify("tree", r#"{"mass": 2.0}"#).unwrap();

        assert!(matches!(outcome, BaselineOutcome::Updated(_)));
        assert_eq!(
            store(dir.path(), false).verify("tree", r#"{"mass": 2.0}"#).unwrap(),
            BaselineOutcome::Matched
        );
    }

    #[test]
    fn test_invalid_actual_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = store(dir.path(), false).verify("tree", "{");
        assert!(matches!(result, Err(BaselineError::Snapshot(_))));
    }
}
