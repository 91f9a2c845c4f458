//! Correlation id generation.
//!
//! A correlation id ties a response envelope back to the request that caused
//! it.  The web UI and the host both generate ids independently, so the ids
//! must be unique without any coordination between the two sides.
//!
//! # Why UUID v4 and not a counter?
//!
//! A per-process counter (0, 1, 2, …) is unique only within one process.  The
//! host and the page would both start at 0 and collide immediately.  A random
//! 122-bit UUID makes collisions between independently generated ids
//! practically impossible, and the textual form is easy to read in recorded
//! traces.

use uuid::Uuid;

/// Returns a fresh correlation id in canonical hyphenated UUID form.
///
/// # Examples
///
/// ```rust
/// use viewbridge_core::protocol::new_correlation_id;
///
/// let id = new_correlation_id();
/// assert_eq!(id.len(), 36);
/// ```
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}
