//! Domain layer for viewbridge-host.
//!
//! Plain data types with no dependencies on I/O, transports or runtimes.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures
//! - The recorded-traffic file model
//!
//! # What does NOT belong here?
//!
//! - Any `tokio` types
//! - File I/O or environment variable reading

pub mod config;
pub mod recording;

pub use config::{BridgeSettings, HarnessConfig, RecorderConfig, SnapshotSettings};
pub use recording::{Direction, Recording, RecordingEntry};
