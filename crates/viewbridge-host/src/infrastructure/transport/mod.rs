//! The transport port.
//!
//! A transport is a single bidirectional pipe of strings between the host and
//! the web UI.  It can post a string to the remote side and raises an event
//! for every string that arrives.  The live implementation (the embedded
//! browser control) lives outside this crate; [`MemoryTransport`] is the
//! in-process double used by tests and by replay tooling.
//!
//! Handlers may be invoked from any thread.  Implementations must not hold
//! their own locks while calling a handler, because a handler commonly posts
//! a reply on the same transport.

pub mod memory;

use std::sync::Arc;

use thiserror::Error;

pub use memory::MemoryTransport;

/// Callback invoked with each raw inbound string.
pub type InboundHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Token returned by [`Transport::add_message_handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

/// Errors a transport can report when posting.
#[derive(Debug, Error)]
pub enum TransportError {
    /// [`Transport::dispose`] has already been called.
    #[error("transport has been disposed")]
    Disposed,

    /// The underlying channel rejected the message.
    #[error("failed to post message: {0}")]
    Post(String),
}

/// A single-channel, string-based message pipe.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Sends one message to the remote side.
    fn post_message(&self, json: &str) -> Result<(), TransportError>;

    /// Registers a handler for inbound messages.
    fn add_message_handler(&self, handler: InboundHandler) -> HandlerId;

    /// Unregisters a handler.  Unknown ids are ignored.
    fn remove_message_handler(&self, id: HandlerId);

    /// Releases the channel.  Later posts fail with
    /// [`TransportError::Disposed`].
    fn dispose(&self);
}
