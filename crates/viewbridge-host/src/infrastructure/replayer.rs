//! Traffic replayer.
//!
//! Reads a trace written by the [`Recorder`](super::Recorder) and drives a
//! [`Bridge`] with it, in file order:
//!
//! | direction  | action                                         |
//! |------------|------------------------------------------------|
//! | `outbound` | [`Bridge::post_envelope`], fields unchanged    |
//! | `inbound`  | [`Bridge::handle_inbound`] as if just received |
//!
//! The whole file is validated before the first envelope is driven, so a bad
//! entry never leaves a half-replayed bridge behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::{Bridge, BridgeError};
use crate::domain::{Direction, Recording};

/// Errors from loading or replaying a trace.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay path must not be empty")]
    EmptyPath,

    #[error("recording not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error reading recording at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed recording at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown direction '{direction}' at entry {index} of {path}")]
    UnknownDirection {
        path: PathBuf,
        index: usize,
        direction: String,
    },

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// How many envelopes a replay drove in each direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub outbound: usize,
    pub inbound: usize,
}

impl ReplaySummary {
    pub fn total(&self) -> usize {
        self.outbound + self.inbound
    }
}

/// Reads and validates a trace file without replaying it.
///
/// # Errors
///
/// Every error names the offending path; see [`ReplayError`].
pub fn load_recording(path: impl AsRef<Path>) -> Result<Recording, ReplayError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ReplayError::EmptyPath);
    }
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReplayError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(ReplayError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let recording: Recording =
        serde_json::from_str(&text).map_err(|source| ReplayError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some((index, entry)) = recording
        .messages
        .iter()
        .enumerate()
        .find(|(_, entry)| matches!(entry.direction, Direction::Other(_)))
    {
        return Err(ReplayError::UnknownDirection {
            path: path.to_path_buf(),
            index,
            direction: entry.direction.to_string(),
        });
    }
    Ok(recording)
}

/// Re-drives a bridge from trace files.
pub struct Replayer {
    bridge: Arc<Bridge>,
}

impl Replayer {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    /// Loads `path` and replays every entry in stored order.
    ///
    /// Inbound entries that match a built-in handshake provoke the bridge's
    /// automatic reply, exactly as live traffic would.
    ///
    /// # Errors
    ///
    /// Any [`load_recording`] error, or [`ReplayError::Bridge`] if an outbound
    /// entry cannot be posted.
    pub fn play(&self, path: impl AsRef<Path>) -> Result<ReplaySummary, ReplayError> {
        let path = path.as_ref();
        let recording = load_recording(path)?;
        let mut summary = ReplaySummary::default();

        for entry in &recording.messages {
            match entry.direction {
                Direction::Outbound => {
                    self.bridge.post_envelope(&entry.to_envelope())?;
                    summary.outbound += 1;
                }
                Direction::Inbound => {
                    let json = entry.to_envelope().to_json().map_err(BridgeError::from)?;
                    self.bridge.handle_inbound(&json);
                    summary.inbound += 1;
                }
                // Rejected by load_recording.
                Direction::Other(_) => {}
            }
        }

        info!(
            path = %path.display(),
            outbound = summary.outbound,
            inbound = summary.inbound,
            "replay finished"
        );
        Ok(summary)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BridgeSettings;
    use crate::infrastructure::transport::MemoryTransport;

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn replayer() -> (Replayer, MemoryTransport) {
        let transport = MemoryTransport::new();
        let bridge = Bridge::new(BridgeSettings::default());
        bridge.initialize(Arc::new(transport.clone()));
        (Replayer::new(bridge), transport)
    }

    #[test]
    fn test_empty_path_is_rejected() {
        assert!(matches!(load_recording(""), Err(ReplayError::EmptyPath)));
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let err = load_recording(&path).unwrap_err();

        assert!(matches!(err, ReplayError::NotFound(ref p) if p == &path));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_missing_messages_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bad.json", r#"{"entries": []}"#);

        let err = load_recording(&path).unwrap_err();

        assert!(matches!(err, ReplayError::Malformed { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_unknown_direction_is_fatal_before_any_traffic() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "t.json",
            r#"{"messages":[
                {"timestampUtc":"2024-01-01T00:00:00Z","direction":"outbound","type":"A","correlationId":"1"},
                {"timestampUtc":"2024-01-01T00:00:01Z","direction":"sideways","type":"B","correlationId":"2"}
            ]}"#,
        );
        let (replayer, transport) = replayer();

        // Act
        let err = replayer.play(&path).unwrap_err();

        // Assert
        assert!(matches!(
            err,
            ReplayError::UnknownDirection { index: 1, ref direction, .. } if direction == "sideways"
        ));
        assert!(transport.posted().is_empty());
    }

    #[test]
    fn test_outbound_entries_are_posted_with_recorded_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "t.json",
            r#"{"messages":[
                {"timestampUtc":"2024-01-01T00:00:00Z","direction":"outbound","type":"A","correlationId":"1","payload":{"x":1}},
                {"timestampUtc":"2024-01-01T00:00:01Z","direction":"outbound","type":"B","correlationId":"2"}
            ]}"#,
        );
        let (replayer, transport) = replayer();

        let summary = replayer.play(&path).unwrap();

        assert_eq!(summary, ReplaySummary { outbound: 2, inbound: 0 });
        let posted = transport.posted_envelopes();
        assert_eq!(posted[0].correlation_id, "1");
        assert_eq!(posted[0].payload, Some(serde_json::json!({"x": 1})));
        assert_eq!(posted[1].message_type, "B");
    }

    #[test]
    fn test_inbound_ping_is_dispatched_and_answered() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "t.json",
            r#"{"messages":[
                {"timestampUtc":"2024-01-01T00:00:00Z","direction":"inbound","type":"PING","correlationId":"p"}
            ]}"#,
        );
        let (replayer, transport) = replayer();

        let summary = replayer.play(&path).unwrap();

        assert_eq!(summary.total(), 1);
        let posted = transport.posted_envelopes();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].message_type, "PONG");
        assert_eq!(posted[0].correlation_id, "p");
    }
}
