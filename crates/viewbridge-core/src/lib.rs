//! # viewbridge-core
//!
//! Shared library for ViewBridge containing the message envelope that travels
//! between the CAD host and its embedded web UI, and the snapshot engine used
//! by regression tests to compare structural exports of an assembly.
//!
//! This crate has zero dependencies on async runtimes, files, or transports.
//! Everything in it is a pure function over values, so it can be called from
//! any thread and from any test without setup.
//!
//! # Architecture overview
//!
//! - **`protocol`** – The JSON envelope (`type`, `correlationId`, `payload`,
//!   `error`), the built-in handshake message types, and correlation id
//!   generation.  The runtime side that actually moves envelopes lives in
//!   `viewbridge-host`.
//!
//! - **`snapshot`** – Canonicalization of JSON trees.  Two exports of the same
//!   model can differ in child ordering, floating-point noise and per-run
//!   identifiers; the normalizer erases all three so a plain string compare is
//!   meaningful.  The strict variant validates the tree against a [`Schema`]
//!   first and reports every violation at once.

pub mod protocol;
pub mod snapshot;

// Re-export the most-used types at the crate root so callers can write
// `viewbridge_core::Envelope` instead of `viewbridge_core::protocol::envelope::Envelope`.
pub use protocol::envelope::{Envelope, EnvelopeError};
pub use protocol::message_types;
pub use snapshot::compare::{LineDifference, SnapshotComparer, SnapshotDiff};
pub use snapshot::normalize::{NormalizeOptions, Normalizer};
pub use snapshot::schema::{
    FieldKind, FieldSpec, ObjectShape, Schema, SchemaViolation, SchemaViolations, StrictNormalizer,
};
pub use snapshot::SnapshotError;
