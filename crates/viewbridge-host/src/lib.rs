//! viewbridge-host library crate.
//!
//! This crate is the host-side runtime of ViewBridge: it moves
//! [`Envelope`](viewbridge_core::Envelope)s between the CAD add-in and its
//! embedded web UI, records and replays that traffic for offline tests, and
//! keeps snapshot baselines on disk.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Web UI (JSON strings over a single pipe)
//!         ↕
//! [viewbridge-host]
//!   ├── domain/           Pure types: HarnessConfig, Recording, Direction
//!   ├── application/      Bridge, pending requests, subscribers, sanitizer
//!   └── infrastructure/
//!         ├── transport/  Transport port + in-memory double
//!         ├── recorder    Tap → redacted trace file
//!         ├── replayer    Trace file → Bridge
//!         ├── baseline    Named snapshot baselines on disk
//!         ├── config_store TOML persistence for HarnessConfig
//!         └── logging     tracing-subscriber setup
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain`, `viewbridge-core`, and the
//!   [`Transport`](infrastructure::transport::Transport) trait only.
//! - `infrastructure` does the file I/O.

/// Domain layer: configuration and recording types (no I/O).
pub mod domain;

/// Application layer: the bridge and its registries.
pub mod application;

/// Infrastructure layer: transports, recorder, replayer, file persistence.
pub mod infrastructure;

pub use application::{Bridge, BridgeError, Subscription};
pub use domain::{Direction, HarnessConfig, Recording, RecordingEntry};
