//! Protocol module containing the envelope type and correlation ids.

pub mod correlation;
pub mod envelope;

pub use correlation::new_correlation_id;
pub use envelope::{message_types, Envelope, EnvelopeError};
