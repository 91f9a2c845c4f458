//! Infrastructure layer for viewbridge-host.
//!
//! Everything that touches the outside world: the transport port and its
//! in-memory double, trace files, baseline files, the TOML configuration file
//! and the log subscriber.
//!
//! # What does NOT belong here?
//!
//! - Dispatch or correlation logic (that is the application layer)

pub mod baseline;
pub mod config_store;
pub mod logging;
pub mod recorder;
pub mod replayer;
pub mod transport;

pub use baseline::{BaselineError, BaselineOutcome, BaselineStore};
pub use config_store::{load_config, parse_config, save_config, ConfigError};
pub use logging::init_tracing;
pub use recorder::{Recorder, RecorderError};
pub use replayer::{load_recording, ReplayError, ReplaySummary, Replayer};
pub use transport::{MemoryTransport, Transport, TransportError};
