//! The JSON envelope exchanged between the host and the web UI.
//!
//! Wire format (field names are stable):
//!
//! ```json
//! {"type":"GET_TREE","correlationId":"0b6c…","payload":{"depth":2}}
//! {"type":"GET_TREE","correlationId":"0b6c…","error":"no active document"}
//! ```
//!
//! `payload` and `error` are omitted when absent.  The presence of `error`
//! marks a failed correlated response.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::protocol::correlation::new_correlation_id;

/// Message types the bridge handles itself, without subscriber involvement.
pub mod message_types {
    /// Liveness probe.  Answered with [`PONG`].
    pub const PING: &str = "PING";
    /// Reply to [`PING`].
    pub const PONG: &str = "PONG";
    /// Sent by the web UI once its page has loaded.
    pub const UI_READY: &str = "UI_READY";
    /// Reply to [`UI_READY`]; payload `{"status":"connected"}`.
    pub const CONNECTION_STATUS: &str = "CONNECTION_STATUS";

    /// Status string carried by the `CONNECTION_STATUS` auto-reply.
    pub const STATUS_CONNECTED: &str = "connected";
}

/// Errors that can occur while encoding or decoding an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The text is not JSON, or not an object with the required fields.
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The envelope could not be serialized.
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// One message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Application-defined message type, e.g. `"GET_TREE"`.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Unique per in-flight request.  For fire-and-forget sends this is an
    /// opaque identifier with no correlation meaning.
    pub correlation_id: String,

    /// Arbitrary JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Set only on a failed correlated response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Builds an envelope with a freshly generated correlation id.
    pub fn new(message_type: impl Into<String>, payload: Option<Value>) -> Self {
        Self::with_correlation_id(message_type, new_correlation_id(), payload)
    }

    /// Builds an envelope with a caller-supplied correlation id.
    pub fn with_correlation_id(
        message_type: impl Into<String>,
        correlation_id: impl Into<String>,
        payload: Option<Value>,
    ) -> Self {
        Self {
            message_type: message_type.into(),
            correlation_id: correlation_id.into(),
            payload,
            error: None,
        }
    }

    /// Builds a correlated reply to `request` carrying `payload`.
    pub fn reply_to(request: &Envelope, payload: Option<Value>) -> Self {
        Self::with_correlation_id(
            request.message_type.clone(),
            request.correlation_id.clone(),
            payload,
        )
    }

    /// Builds a correlated failure reply to `request`.
    pub fn error_reply_to(request: &Envelope, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::reply_to(request, None)
        }
    }

    /// Returns `true` if this envelope reports a failed correlated response.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Parses one envelope from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Malformed`] if the text is not valid JSON or is
    /// missing `type` / `correlationId`.
    pub fn from_json(text: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(text).map_err(EnvelopeError::Malformed)
    }

    /// Serializes the envelope to compact JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Serialize`] if the payload cannot be encoded.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(EnvelopeError::Serialize)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
