//! Application layer for viewbridge-host.
//!
//! Knows *what* to do with envelopes (correlate, auto-reply, publish, redact)
//! but delegates moving bytes to a
//! [`Transport`](crate::infrastructure::transport::Transport).
//!
//! # What does NOT belong here?
//!
//! - File I/O (recording, replay and baselines are infrastructure)
//! - Any concrete transport

pub mod bridge_service;
pub mod pending;
pub mod sanitize;
pub mod subscribers;

pub use bridge_service::{Bridge, BridgeError};
pub use pending::PendingRegistry;
pub use sanitize::{sanitize, REDACTED};
pub use subscribers::{EnvelopeCallback, Subscription};
