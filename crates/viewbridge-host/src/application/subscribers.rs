//! Publish/subscribe registry for envelope callbacks.
//!
//! Used for three lists on the bridge: message subscribers, the outbound tap
//! and the inbound tap.  Registering returns a [`Subscription`]; disposing it
//! (explicitly or by dropping it) removes the callback.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use viewbridge_core::Envelope;

/// Callback invoked with an envelope.
pub type EnvelopeCallback = Arc<dyn Fn(&Envelope) + Send + Sync>;

struct Entry {
    id: u64,
    /// `None` matches every message type.
    message_type: Option<String>,
    callback: EnvelopeCallback,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl Inner {
    fn remove(&self, id: u64) {
        self.entries.lock().retain(|entry| entry.id != id);
    }
}

#[derive(Default)]
pub struct HandlerRegistry {
    inner: Arc<Inner>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `message_type`, or for every type if `None`.
    pub fn add(&self, message_type: Option<&str>, callback: EnvelopeCallback) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.entries.lock().push(Entry {
            id,
            message_type: message_type.map(str::to_string),
            callback,
        });
        Subscription {
            registry: Arc::downgrade(&self.inner),
            id,
            disposed: AtomicBool::new(false),
        }
    }

    /// Calls every matching callback in registration order and returns how
    /// many were called.
    ///
    /// The matching callbacks are copied out first, so a callback may add or
    /// dispose subscriptions on this registry.
    pub fn emit(&self, envelope: &Envelope) -> usize {
        let matching: Vec<EnvelopeCallback> = self
            .inner
            .entries
            .lock()
            .iter()
            .filter(|entry| {
                entry
                    .message_type
                    .as_deref()
                    .map_or(true, |wanted| wanted == envelope.message_type)
            })
            .map(|entry| Arc::clone(&entry.callback))
            .collect();
        for callback in &matching {
            callback(envelope);
        }
        matching.len()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to a registered callback.
///
/// Dropping the handle unregisters the callback, so keep it alive for as long
/// as the callback should fire.
#[must_use = "dropping a Subscription unregisters its callback"]
pub struct Subscription {
    registry: Weak<Inner>,
    id: u64,
    disposed: AtomicBool,
}

impl Subscription {
    /// Unregisters the callback.  Calling this more than once is harmless.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
