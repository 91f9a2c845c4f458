//! Registry of requests awaiting a correlated response.
//!
//! Each entry maps a correlation id to the sending half of a oneshot channel.
//! Whoever removes the entry first owns the outcome: the dispatcher when a
//! response arrives, or the requester when its timer fires.  Because removal
//! happens under the lock, a response can resolve a request at most once.
//!
//! Ids of requests that gave up are remembered in a bounded ring so that a
//! response turning up afterwards can be recognised and dropped instead of
//! reaching subscribers as a fresh message.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;
use viewbridge_core::Envelope;

/// How many abandoned correlation ids are remembered.
pub const EXPIRED_CAPACITY: usize = 256;

/// What [`PendingRegistry::resolve`] did with an inbound envelope.
#[derive(Debug)]
pub enum Resolution {
    /// A waiting request took the envelope.
    Resolved,
    /// The envelope answers a request that already timed out or was cleared.
    Expired(Envelope),
    /// No request was waiting on this correlation id; the envelope is handed
    /// back for ordinary dispatch.
    Unmatched(Envelope),
}

#[derive(Debug, Default)]
struct Entries {
    waiting: HashMap<String, oneshot::Sender<Envelope>>,
    expired: VecDeque<String>,
}

impl Entries {
    fn remember_expired(&mut self, correlation_id: String) {
        if self.expired.len() == EXPIRED_CAPACITY {
            self.expired.pop_front();
        }
        self.expired.push_back(correlation_id);
    }
}

#[derive(Debug, Default)]
pub struct PendingRegistry {
    entries: Mutex<Entries>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `correlation_id` and returns the receiver its response will
    /// arrive on.  Returns `None` if the id is already registered.
    pub fn register(&self, correlation_id: &str) -> Option<oneshot::Receiver<Envelope>> {
        let mut entries = self.entries.lock();
        if entries.waiting.contains_key(correlation_id) {
            return None;
        }
        let (sender, receiver) = oneshot::channel();
        entries.waiting.insert(correlation_id.to_string(), sender);
        Some(receiver)
    }

    /// Hands `envelope` to the request waiting on its correlation id, if any.
    pub fn resolve(&self, envelope: Envelope) -> Resolution {
        let mut entries = self.entries.lock();
        let sender = entries.waiting.remove(&envelope.correlation_id);
        match sender {
            Some(sender) => {
                drop(entries);
                if let Err(envelope) = sender.send(envelope) {
                    debug!(
                        correlation_id = %envelope.correlation_id,
                        "response arrived after the requester stopped waiting"
                    );
                }
                Resolution::Resolved
            }
            None if entries.expired.contains(&envelope.correlation_id) => {
                Resolution::Expired(envelope)
            }
            None => Resolution::Unmatched(envelope),
        }
    }

    /// Removes an entry without remembering it.  Returns `true` if it was
    /// still present.
    pub fn remove(&self, correlation_id: &str) -> bool {
        self.entries.lock().waiting.remove(correlation_id).is_some()
    }

    /// Removes an entry whose requester gave up, and remembers the id so a
    /// late response is recognised.  Returns `true` if it was still present.
    pub fn expire(&self, correlation_id: &str) -> bool {
        let mut entries = self.entries.lock();
        let present = entries.waiting.remove(correlation_id).is_some();
        entries.remember_expired(correlation_id.to_string());
        present
    }

    /// Drops every entry without resolving it and remembers their ids as
    /// expired.  Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let ids: Vec<String> = entries.waiting.drain().map(|(id, _)| id).collect();
        let count = ids.len();
        for id in ids {
            entries.remember_expired(id);
        }
        count
    }

    pub fn contains(&self, correlation_id: &str) -> bool {
        self.entries.lock().waiting.contains_key(correlation_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().waiting.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
