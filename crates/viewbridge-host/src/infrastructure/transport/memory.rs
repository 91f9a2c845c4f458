//! In-memory [`Transport`] implementation.
//!
//! A standalone `MemoryTransport` keeps every posted string in a log and lets
//! the test play the remote side with [`MemoryTransport::inject`].  Two
//! transports created with [`MemoryTransport::pair`] are cross-wired: a post
//! on one is delivered synchronously to the handlers of the other, which is
//! enough to run two bridges against each other in a single test.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;
use viewbridge_core::Envelope;

use super::{HandlerId, InboundHandler, Transport, TransportError};

#[derive(Default)]
struct Inner {
    posted: Mutex<Vec<String>>,
    handlers: Mutex<Vec<(HandlerId, InboundHandler)>>,
    next_handler_id: AtomicU64,
    disposed: AtomicBool,
    peer: Mutex<Option<Weak<Inner>>>,
}

impl Inner {
    fn deliver(&self, json: &str) {
        // Copy the handler list out so handlers can post (or unsubscribe)
        // without deadlocking.
        let handlers: Vec<InboundHandler> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(json.to_string());
        }
    }
}

/// Cloneable handle to an in-memory transport; clones share state.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Inner>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates two transports wired to each other.
    pub fn pair() -> (Self, Self) {
        let left = Self::new();
        let right = Self::new();
        *left.inner.peer.lock() = Some(Arc::downgrade(&right.inner));
        *right.inner.peer.lock() = Some(Arc::downgrade(&left.inner));
        (left, right)
    }

    /// Simulates a message arriving from the remote side.
    pub fn inject(&self, json: &str) {
        self.inner.deliver(json);
    }

    /// Serializes `envelope` and injects it.
    pub fn inject_envelope(&self, envelope: &Envelope) {
        match envelope.to_json() {
            Ok(json) => self.inject(&json),
            Err(err) => debug!(error = %err, "could not encode injected envelope"),
        }
    }

    /// Every string posted so far, oldest first.
    pub fn posted(&self) -> Vec<String> {
        self.inner.posted.lock().clone()
    }

    /// Posted strings that parse as envelopes, oldest first.
    pub fn posted_envelopes(&self) -> Vec<Envelope> {
        self.inner
            .posted
            .lock()
            .iter()
            .filter_map(|json| Envelope::from_json(json).ok())
            .collect()
    }

    pub fn clear_posted(&self) {
        self.inner.posted.lock().clear();
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.lock().len()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl Transport for MemoryTransport {
    fn post_message(&self, json: &str) -> Result<(), TransportError> {
        if self.is_disposed() {
            return Err(TransportError::Disposed);
        }
        self.inner.posted.lock().push(json.to_string());

        let peer = self.inner.peer.lock().as_ref().and_then(Weak::upgrade);
        if let Some(peer) = peer {
            if !peer.disposed.load(Ordering::SeqCst) {
                peer.deliver(json);
            }
        }
        Ok(())
    }

    fn add_message_handler(&self, handler: InboundHandler) -> HandlerId {
        let id = HandlerId(self.inner.next_handler_id.fetch_add(1, Ordering::SeqCst));
        self.inner.handlers.lock().push((id, handler));
        id
    }

    fn remove_message_handler(&self, id: HandlerId) {
        self.inner
            .handlers
            .lock()
            .retain(|(existing, _)| *existing != id);
    }

    fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.inner.handlers.lock().clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
