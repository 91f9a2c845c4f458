//! The recorded-traffic file model.
//!
//! A recording is one JSON document:
//!
//! ```json
//! {
//!   "messages": [
//!     {
//!       "timestampUtc": "2024-05-01T09:30:00.123Z",
//!       "direction": "outbound",
//!       "type": "GET_TREE",
//!       "correlationId": "0b6c…",
//!       "payload": {"depth": 2}
//!     }
//!   ]
//! }
//! ```
//!
//! List order is the replay order.  Timestamps are informational only.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use viewbridge_core::Envelope;

/// Which way an envelope was travelling when it was captured.
///
/// Unrecognised strings are kept as [`Direction::Other`] so a file with a bad
/// entry still loads and the replayer can report exactly which entry is bad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    /// Host → web UI.
    Outbound,
    /// Web UI → host.
    Inbound,
    Other(String),
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
            Direction::Other(raw) => raw,
        }
    }
}

impl From<String> for Direction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "outbound" => Direction::Outbound,
            "inbound" => Direction::Inbound,
            _ => Direction::Other(raw),
        }
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingEntry {
    pub timestamp_utc: DateTime<Utc>,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub message_type: String,
    pub correlation_id: String,
    /// Already redacted when produced by the recorder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordingEntry {
    /// Captures `envelope` now, storing `payload` in place of the envelope's
    /// own payload.
    pub fn capture(direction: Direction, envelope: &Envelope, payload: Option<Value>) -> Self {
        Self {
            timestamp_utc: Utc::now(),
            direction,
            message_type: envelope.message_type.clone(),
            correlation_id: envelope.correlation_id.clone(),
            payload,
            error: envelope.error.clone(),
        }
    }

    /// Rebuilds the envelope this entry was captured from.
    pub fn to_envelope(&self) -> Envelope {
        Envelope {
            message_type: self.message_type.clone(),
            correlation_id: self.correlation_id.clone(),
            payload: self.payload.clone(),
            error: self.error.clone(),
        }
    }
}

/// An ordered trace of captured envelopes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub messages: Vec<RecordingEntry>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: RecordingEntry) {
        self.messages.push(entry);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Removes the most recent entry in `direction` carrying
    /// `correlation_id`.  Returns `true` if one was found.
    pub fn retract(&mut self, direction: &Direction, correlation_id: &str) -> bool {
        let found = self.messages.iter().rposition(|entry| {
            &entry.direction == direction && entry.correlation_id == correlation_id
        });
        match found {
            Some(index) => {
                self.messages.remove(index);
                true
            }
            None => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
