//! Traffic recorder.
//!
//! Taps a [`Bridge`] in both directions and writes the captured envelopes to
//! a JSON trace file when stopped.  Payloads are redacted with
//! [`sanitize`] before they are stored, so secrets never reach the disk.
//!
//! ```text
//! start(path) ──► on_outbound / on_inbound taps ──► Recording (in memory)
//! stop()      ──► unsubscribe ──► serde_json::to_string_pretty ──► path
//! ```
//!
//! An outbound message whose post fails is taken back out of the recording,
//! so the trace only holds traffic that actually crossed the transport.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;
use viewbridge_core::Envelope;

use crate::application::{sanitize, Bridge, Subscription};
use crate::domain::{Direction, RecorderConfig, Recording, RecordingEntry};

/// Errors from [`Recorder`].
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("recording path must not be empty")]
    EmptyPath,

    #[error("I/O error writing recording at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize recording: {0}")]
    Serialize(#[from] serde_json::Error),
}

struct Session {
    path: PathBuf,
    recording: Arc<Mutex<Recording>>,
    outbound: Subscription,
    retract: Subscription,
    inbound: Subscription,
}

/// Records one bridge's traffic to a file.
pub struct Recorder {
    bridge: Arc<Bridge>,
    config: Arc<RecorderConfig>,
    session: Mutex<Option<Session>>,
}

impl Recorder {
    pub fn new(bridge: Arc<Bridge>, config: RecorderConfig) -> Self {
        Self {
            bridge,
            config: Arc::new(config),
            session: Mutex::new(None),
        }
    }

    /// Starts capturing.  The file is written by [`Recorder::stop`].
    ///
    /// # Errors
    ///
    /// - [`RecorderError::AlreadyRecording`] if a session is active.
    /// - [`RecorderError::EmptyPath`] if `path` is empty.
    /// - [`RecorderError::Io`] if the destination directory cannot be created.
    pub fn start(&self, path: impl AsRef<Path>) -> Result<(), RecorderError> {
        let path = path.as_ref();
        let mut session = self.session.lock();
        if session.is_some() {
            return Err(RecorderError::AlreadyRecording);
        }
        if path.as_os_str().is_empty() {
            return Err(RecorderError::EmptyPath);
        }
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| RecorderError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let recording = Arc::new(Mutex::new(Recording::new()));
        let outbound = self.tap(Direction::Outbound, &recording);
        let inbound = self.tap(Direction::Inbound, &recording);
        let retract = {
            let recording = Arc::clone(&recording);
            self.bridge.on_outbound_failed(move |envelope| {
                recording
                    .lock()
                    .retract(&Direction::Outbound, &envelope.correlation_id);
            })
        };
        *session = Some(Session {
            path: path.to_path_buf(),
            recording,
            outbound,
            retract,
            inbound,
        });

        info!(path = %path.display(), "recording started");
        Ok(())
    }

    fn tap(&self, direction: Direction, recording: &Arc<Mutex<Recording>>) -> Subscription {
        let inbound = direction == Direction::Inbound;
        let recording = Arc::clone(recording);
        let config = Arc::clone(&self.config);
        let capture = move |envelope: &Envelope| {
            let payload = envelope
                .payload
                .as_ref()
                .map(|payload| sanitize(payload, &config));
            recording
                .lock()
                .push(RecordingEntry::capture(direction.clone(), envelope, payload));
        };
        if inbound {
            self.bridge.on_inbound(capture)
        } else {
            self.bridge.on_outbound(capture)
        }
    }

    /// Stops capturing and writes the trace as indented JSON.
    ///
    /// Returns the path written, or `None` if no recording was in progress.
    ///
    /// # Errors
    ///
    /// [`RecorderError::Io`] or [`RecorderError::Serialize`] if the file
    /// cannot be written.  The session is over either way.
    pub fn stop(&self) -> Result<Option<PathBuf>, RecorderError> {
        let Some(session) = self.session.lock().take() else {
            return Ok(None);
        };
        session.outbound.dispose();
        session.retract.dispose();
        session.inbound.dispose();
        let path = session.path.clone();

        let recording = session.recording.lock().clone();
        let text = serde_json::to_string_pretty(&recording)?;
        std::fs::write(&path, text).map_err(|source| RecorderError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), entries = recording.len(), "recording saved");
        Ok(Some(path))
    }

    pub fn is_recording(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Entries captured so far in the active session (0 when idle).
    pub fn entry_count(&self) -> usize {
        self.session
            .lock()
            .as_ref()
            .map_or(0, |session| session.recording.lock().len())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
