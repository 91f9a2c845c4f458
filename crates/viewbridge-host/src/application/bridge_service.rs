//! The message bridge between the host and the web UI.
//!
//! [`Bridge`] owns one [`Transport`] and turns its raw strings into
//! [`Envelope`]s.  It offers two ways to send:
//!
//! - **fire-and-forget** ([`Bridge::send`]): post and return immediately.
//! - **request/await** ([`Bridge::send_request`]): post, then wait until an
//!   envelope with the same correlation id comes back or the timeout expires,
//!   whichever happens first.
//!
//! # Inbound dispatch
//!
//! ```text
//! raw string ──parse──► inbound taps ──► pending request with this id?
//!                                             │ yes → resolve it, stop
//!                                             │ timed out earlier → drop it
//!                                             │ no
//!                                             ▼
//!                                   PING     → reply PONG
//!                                   UI_READY → reply CONNECTION_STATUS
//!                                   other    → subscribers
//! ```
//!
//! Unparseable strings are logged and dropped; nothing is ever thrown back
//! across the transport boundary.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use viewbridge_core::{message_types, Envelope, EnvelopeError};

use crate::application::pending::{PendingRegistry, Resolution};
use crate::application::subscribers::{EnvelopeCallback, HandlerRegistry, Subscription};
use crate::domain::BridgeSettings;
use crate::infrastructure::transport::{HandlerId, InboundHandler, Transport, TransportError};

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors returned by [`Bridge`] operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No response arrived within the request's budget.
    #[error("request '{message_type}' timed out after {timeout_ms} ms")]
    Timeout { message_type: String, timeout_ms: u64 },

    /// [`Bridge::initialize`] has not been called, or the bridge was shut down.
    #[error("bridge is not initialized with a transport")]
    NotInitialized,

    /// A request with this correlation id is already waiting.
    #[error("correlation id {0} is already awaiting a response")]
    DuplicateCorrelationId(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

// ── Bridge ────────────────────────────────────────────────────────────────────

struct Binding {
    transport: Arc<dyn Transport>,
    handler_id: HandlerId,
}

/// Correlating message bridge over a single [`Transport`].
///
/// Always used through an `Arc`; the transport's inbound handler holds only a
/// weak reference back to the bridge.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use viewbridge_host::application::Bridge;
/// use viewbridge_host::domain::BridgeSettings;
/// use viewbridge_host::infrastructure::transport::MemoryTransport;
///
/// let transport = MemoryTransport::new();
/// let bridge = Bridge::new(BridgeSettings::default());
/// bridge.initialize(Arc::new(transport.clone()));
///
/// bridge.send("HELLO", None).unwrap();
/// assert_eq!(transport.posted_envelopes()[0].message_type, "HELLO");
/// ```
pub struct Bridge {
    binding: Mutex<Option<Binding>>,
    pending: PendingRegistry,
    subscribers: HandlerRegistry,
    outbound_taps: HandlerRegistry,
    failed_taps: HandlerRegistry,
    inbound_taps: HandlerRegistry,
    default_timeout: Duration,
    this: Weak<Bridge>,
}

impl Bridge {
    pub fn new(settings: BridgeSettings) -> Arc<Self> {
        let default_timeout = settings.request_timeout();
        Arc::new_cyclic(|this| Self {
            binding: Mutex::new(None),
            pending: PendingRegistry::new(),
            subscribers: HandlerRegistry::new(),
            outbound_taps: HandlerRegistry::new(),
            failed_taps: HandlerRegistry::new(),
            inbound_taps: HandlerRegistry::new(),
            default_timeout,
            this: this.clone(),
        })
    }

    /// Binds the bridge to `transport`.
    ///
    /// A previously bound transport is unhooked and disposed (unless it is the
    /// same transport).  Requests already in flight are not failed; if their
    /// response never arrives they time out as usual.
    pub fn initialize(&self, transport: Arc<dyn Transport>) {
        let this = self.this.clone();
        let handler: InboundHandler = Arc::new(move |raw: String| {
            if let Some(bridge) = this.upgrade() {
                bridge.handle_inbound(&raw);
            }
        });
        let handler_id = transport.add_message_handler(handler);

        let previous = self.binding.lock().replace(Binding {
            transport: Arc::clone(&transport),
            handler_id,
        });
        if let Some(old) = previous {
            old.transport.remove_message_handler(old.handler_id);
            if !Arc::ptr_eq(&old.transport, &transport) {
                old.transport.dispose();
            }
            info!("bridge rebound to a new transport");
        } else {
            info!("bridge initialized");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.lock().is_some()
    }

    /// Number of requests currently awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // ── Sending ───────────────────────────────────────────────────────────────

    /// Posts a fire-and-forget message and returns its correlation id.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotInitialized`] without a transport, or the transport's
    /// own error if the post fails.
    pub fn send(&self, message_type: &str, payload: Option<Value>) -> Result<String, BridgeError> {
        let envelope = Envelope::new(message_type, payload);
        self.post(&envelope)?;
        Ok(envelope.correlation_id)
    }

    /// Posts a message with a caller-supplied correlation id.
    pub fn send_raw(
        &self,
        message_type: &str,
        payload: Option<Value>,
        correlation_id: &str,
    ) -> Result<(), BridgeError> {
        self.post(&Envelope::with_correlation_id(
            message_type,
            correlation_id,
            payload,
        ))
    }

    /// Posts `envelope` exactly as given, including its `error` field.
    ///
    /// Used by replay, where recorded replies must be reproduced unchanged.
    pub fn post_envelope(&self, envelope: &Envelope) -> Result<(), BridgeError> {
        self.post(envelope)
    }

    /// Posts a successful correlated reply to `request`.
    pub fn respond(&self, request: &Envelope, payload: Option<Value>) -> Result<(), BridgeError> {
        self.post(&Envelope::reply_to(request, payload))
    }

    /// Posts a failed correlated reply to `request`.
    pub fn respond_error(&self, request: &Envelope, message: &str) -> Result<(), BridgeError> {
        self.post(&Envelope::error_reply_to(request, message))
    }

    /// Sends a request and waits for the correlated response.
    ///
    /// The response envelope is returned as-is; check
    /// [`Envelope::is_error`] for a failure reported by the remote side.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Timeout`] when nothing arrives within `timeout`.  The
    /// pending entry is removed before the error is returned, so a response
    /// arriving later resolves nothing.
    pub async fn send_request(
        &self,
        message_type: &str,
        payload: Option<Value>,
        timeout: Duration,
    ) -> Result<Envelope, BridgeError> {
        let envelope = Envelope::new(message_type, payload);
        let correlation_id = envelope.correlation_id.clone();
        let deadline = Instant::now() + timeout;

        let receiver = self
            .pending
            .register(&correlation_id)
            .ok_or_else(|| BridgeError::DuplicateCorrelationId(correlation_id.clone()))?;

        if let Err(err) = self.post(&envelope) {
            self.pending.remove(&correlation_id);
            return Err(err);
        }

        match tokio::time::timeout_at(deadline, receiver).await {
            Ok(Ok(response)) => {
                debug!(%message_type, %correlation_id, "request resolved");
                Ok(response)
            }
            Ok(Err(_)) => {
                // The registration was cleared by shutdown.  Nothing can
                // resolve it any more, so wait out the budget.
                tokio::time::sleep_until(deadline).await;
                Err(timeout_error(message_type, timeout))
            }
            Err(_) => {
                self.pending.expire(&correlation_id);
                warn!(%message_type, %correlation_id, "request timed out");
                Err(timeout_error(message_type, timeout))
            }
        }
    }

    /// [`Bridge::send_request`] with the configured default timeout.
    pub async fn request(
        &self,
        message_type: &str,
        payload: Option<Value>,
    ) -> Result<Envelope, BridgeError> {
        self.send_request(message_type, payload, self.default_timeout)
            .await
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    fn post(&self, envelope: &Envelope) -> Result<(), BridgeError> {
        let transport = self
            .binding
            .lock()
            .as_ref()
            .map(|binding| Arc::clone(&binding.transport))
            .ok_or(BridgeError::NotInitialized)?;
        let json = envelope.to_json()?;

        // Taps run before the post so that, with a synchronous transport, an
        // outbound message is observed before any reply it provokes.  A post
        // that fails is reported to the failure taps so observers can take
        // the message back.
        self.outbound_taps.emit(envelope);
        if let Err(err) = transport.post_message(&json) {
            self.failed_taps.emit(envelope);
            warn!(
                error = %err,
                message_type = %envelope.message_type,
                correlation_id = %envelope.correlation_id,
                "post failed"
            );
            return Err(err.into());
        }

        debug!(
            message_type = %envelope.message_type,
            correlation_id = %envelope.correlation_id,
            "posted"
        );
        Ok(())
    }

    // ── Receiving ─────────────────────────────────────────────────────────────

    /// Dispatches one raw inbound string.
    ///
    /// This is what the transport handler calls; it is public so replay and
    /// tests can drive the bridge without a transport.
    pub fn handle_inbound(&self, raw: &str) {
        let envelope = match Envelope::from_json(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "dropping malformed inbound message");
                return;
            }
        };
        debug!(
            message_type = %envelope.message_type,
            correlation_id = %envelope.correlation_id,
            "received"
        );
        self.inbound_taps.emit(&envelope);

        let envelope = match self.pending.resolve(envelope) {
            Resolution::Resolved => return,
            Resolution::Expired(envelope) => {
                debug!(
                    message_type = %envelope.message_type,
                    correlation_id = %envelope.correlation_id,
                    "dropping late response"
                );
                return;
            }
            Resolution::Unmatched(envelope) => envelope,
        };

        match envelope.message_type.as_str() {
            message_types::PING => self.auto_reply(&envelope, message_types::PONG, None),
            message_types::UI_READY => self.auto_reply(
                &envelope,
                message_types::CONNECTION_STATUS,
                Some(json!({ "status": message_types::STATUS_CONNECTED })),
            ),
            _ => {
                if self.subscribers.emit(&envelope) == 0 {
                    debug!(
                        message_type = %envelope.message_type,
                        "no subscriber for inbound message"
                    );
                }
            }
        }
    }

    /// Replies reusing the inbound correlation id, so a peer that sent the
    /// handshake as a request is resolved by the reply.
    fn auto_reply(&self, inbound: &Envelope, reply_type: &str, payload: Option<Value>) {
        let reply =
            Envelope::with_correlation_id(reply_type, inbound.correlation_id.clone(), payload);
        if let Err(err) = self.post(&reply) {
            warn!(
                error = %err,
                message_type = %inbound.message_type,
                "could not send automatic reply"
            );
        }
    }

    // ── Subscriptions ─────────────────────────────────────────────────────────

    /// Calls `callback` for every uncorrelated inbound message of
    /// `message_type`.
    pub fn subscribe<F>(&self, message_type: &str, callback: F) -> Subscription
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.subscribers
            .add(Some(message_type), Arc::new(callback) as EnvelopeCallback)
    }

    /// Calls `callback` for every uncorrelated, non-handshake inbound message.
    pub fn subscribe_all<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.subscribers.add(None, Arc::new(callback) as EnvelopeCallback)
    }

    /// Observes every envelope this bridge posts.
    pub fn on_outbound<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.outbound_taps
            .add(None, Arc::new(callback) as EnvelopeCallback)
    }

    /// Observes every envelope whose post failed after the outbound taps had
    /// already seen it.
    pub fn on_outbound_failed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.failed_taps
            .add(None, Arc::new(callback) as EnvelopeCallback)
    }

    /// Observes every envelope this bridge successfully parses.
    pub fn on_inbound<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.inbound_taps
            .add(None, Arc::new(callback) as EnvelopeCallback)
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    /// Unhooks and disposes the transport, then forgets every pending request.
    ///
    /// Forgotten requests are neither resolved nor failed here; each caller
    /// receives [`BridgeError::Timeout`] when its own budget runs out.
    pub fn shutdown(&self) {
        let binding = self.binding.lock().take();
        if let Some(binding) = binding {
            binding.transport.remove_message_handler(binding.handler_id);
            binding.transport.dispose();
        }
        let dropped = self.pending.clear();
        info!(dropped_requests = dropped, "bridge shut down");
    }
}

fn timeout_error(message_type: &str, timeout: Duration) -> BridgeError {
    BridgeError::Timeout {
        message_type: message_type.to_string(),
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::transport::{MemoryTransport, MockTransport};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bridge_with_memory() -> (Arc<Bridge>, MemoryTransport) {
        let transport = MemoryTransport::new();
        let bridge = Bridge::new(BridgeSettings::default());
        bridge.initialize(Arc::new(transport.clone()));
        (bridge, transport)
    }

    fn inbound(message_type: &str, correlation_id: &str, payload: Option<Value>) -> String {
        Envelope::with_correlation_id(message_type, correlation_id, payload)
            .to_json()
            .unwrap()
    }

    // ── Sending ───────────────────────────────────────────────────────────────

    #[test]
    fn test_send_posts_envelope_with_fresh_correlation_id() {
        // Arrange
        let (bridge, transport) = bridge_with_memory();

        // Act
        let first = bridge.send("SELECT", Some(json!({"path": "a"}))).unwrap();
        let second = bridge.send("SELECT", None).unwrap();

        // Assert
        let posted = transport.posted_envelopes();
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[0].correlation_id, first);
        assert_eq!(posted[0].payload, Some(json!({"path": "a"})));
        assert_ne!(first, second);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[test]
    fn test_send_without_transport_fails() {
        let bridge = Bridge::new(BridgeSettings::default());
        let result = bridge.send("X", None);
        assert!(matches!(result, Err(BridgeError::NotInitialized)));
        assert!(!bridge.is_initialized());
    }

    #[test]
    fn test_transport_failure_is_surfaced() {
        // Arrange
        let mut mock = MockTransport::new();
        mock.expect_add_message_handler().returning(|_| HandlerId(7));
        mock.expect_post_message()
            .returning(|_| Err(TransportError::Post("pipe closed".into())));
        let bridge = Bridge::new(BridgeSettings::default());
        bridge.initialize(Arc::new(mock));

        // Act
        let result = bridge.send("X", None);

        // Assert
        assert!(matches!(
            result,
            Err(BridgeError::Transport(TransportError::Post(_)))
        ));
    }

    #[test]
    fn test_failed_post_is_reported_to_failure_taps() {
        // Arrange
        let mut mock = MockTransport::new();
        mock.expect_add_message_handler().returning(|_| HandlerId(1));
        mock.expect_post_message()
            .returning(|_| Err(TransportError::Disposed));
        let bridge = Bridge::new(BridgeSettings::default());
        bridge.initialize(Arc::new(mock));
        let failed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&failed);
        let _tap = bridge.on_outbound_failed(move |env| sink.lock().push(env.clone()));

        // Act
        let result = bridge.send_raw("NEVER_SENT", None, "n-1");

        // Assert
        assert!(matches!(result, Err(BridgeError::Transport(TransportError::Disposed))));
        let failed = failed.lock();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].correlation_id, "n-1");
    }

    #[test]
    fn test_successful_post_does_not_reach_failure_taps() {
        let (bridge, _transport) = bridge_with_memory();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _tap = bridge.on_outbound_failed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bridge.send("OK", None).unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_post_envelope_keeps_error_field() {
        let (bridge, transport) = bridge_with_memory();
        let request = Envelope::with_correlation_id("SAVE", "r-9", None);
        let reply = Envelope::error_reply_to(&request, "read-only");

        bridge.post_envelope(&reply).unwrap();

        assert_eq!(transport.posted_envelopes(), vec![reply]);
    }

    #[test]
    fn test_respond_and_respond_error_reuse_correlation_id() {
        let (bridge, transport) = bridge_with_memory();
        let request = Envelope::with_correlation_id("GET_TREE", "c-42", None);

        bridge.respond(&request, Some(json!({"ok": true}))).unwrap();
        bridge.respond_error(&request, "no document").unwrap();

        let posted = transport.posted_envelopes();
        assert_eq!(posted[0].correlation_id, "c-42");
        assert!(!posted[0].is_error());
        assert_eq!(posted[1].correlation_id, "c-42");
        assert_eq!(posted[1].error.as_deref(), Some("no document"));
    }

    #[test]
    fn test_send_raw_keeps_supplied_correlation_id() {
        let (bridge, transport) = bridge_with_memory();
        bridge.send_raw("REPLAYED", None, "fixed-id").unwrap();
        assert_eq!(transport.posted_envelopes()[0].correlation_id, "fixed-id");
    }

    // ── Requests ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_request_resolves_with_matching_response() {
        // Arrange: a peer bridge that answers GET_TREE.
        let (left, right) = MemoryTransport::pair();
        let client = Bridge::new(BridgeSettings::default());
        let server = Bridge::new(BridgeSettings::default());
        client.initialize(Arc::new(left));
        server.initialize(Arc::new(right));
        let responder = Arc::clone(&server);
        let _sub = server.subscribe("GET_TREE", move |request| {
            let _ = responder.respond(request, Some(json!({"children": []})));
        });

        // Act
        let response = client
            .send_request("GET_TREE", None, Duration::from_secs(1))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.payload, Some(json!({"children": []})));
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_times_out_and_cleans_up() {
        let (bridge, _transport) = bridge_with_memory();

        let err = bridge
            .send_request("FOO", None, Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BridgeError::Timeout { ref message_type, timeout_ms: 50 } if message_type == "FOO"
        ));
        assert!(err.to_string().contains("FOO"));
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_request_uses_configured_default_timeout() {
        let bridge = Bridge::new(BridgeSettings {
            request_timeout_ms: 10,
        });
        bridge.initialize(Arc::new(MemoryTransport::new()));
        assert_eq!(bridge.default_timeout(), Duration::from_millis(10));

        let err = bridge.request("SLOW", None).await.unwrap_err();

        assert!(matches!(err, BridgeError::Timeout { timeout_ms: 10, .. }));
    }

    #[tokio::test]
    async fn test_late_response_is_not_published_to_subscribers() {
        // Arrange
        let (bridge, transport) = bridge_with_memory();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _sub = bridge.subscribe("GET_TREE", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let err = bridge
            .send_request("GET_TREE", None, Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Timeout { .. }));
        let request = transport.posted_envelopes().remove(0);

        // Act
        transport.inject_envelope(&Envelope::reply_to(&request, Some(json!({"children": []}))));
        transport.inject_envelope(&Envelope::reply_to(&request, None));

        // Assert
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_post_does_not_leave_pending_entry() {
        let bridge = Bridge::new(BridgeSettings::default());
        let err = bridge
            .send_request("X", None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotInitialized));
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_leaves_waiter_to_time_out() {
        // Arrange
        let (bridge, transport) = bridge_with_memory();
        let waiter = {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move {
                bridge
                    .send_request("LONG", None, Duration::from_millis(200))
                    .await
            })
        };
        while bridge.pending_count() == 0 {
            tokio::task::yield_now().await;
        }
        let started = Instant::now();

        // Act
        bridge.shutdown();
        let result = waiter.await.unwrap();

        // Assert
        assert!(matches!(result, Err(BridgeError::Timeout { .. })));
        assert!(started.elapsed() > Duration::ZERO);
        assert!(transport.is_disposed());
        assert_eq!(transport.handler_count(), 0);
        assert!(!bridge.is_initialized());
    }

    // ── Inbound dispatch ──────────────────────────────────────────────────────

    #[test]
    fn test_ping_is_answered_with_pong_on_same_id() {
        let (bridge, transport) = bridge_with_memory();

        transport.inject(&inbound("PING", "p-1", None));

        let posted = transport.posted_envelopes();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].message_type, "PONG");
        assert_eq!(posted[0].correlation_id, "p-1");
        drop(bridge);
    }

    #[test]
    fn test_ui_ready_is_answered_with_connection_status() {
        let (_bridge, transport) = bridge_with_memory();

        transport.inject(&inbound("UI_READY", "u-1", None));

        let posted = transport.posted_envelopes();
        assert_eq!(posted[0].message_type, "CONNECTION_STATUS");
        assert_eq!(posted[0].payload, Some(json!({"status": "connected"})));
        assert_eq!(posted[0].correlation_id, "u-1");
    }

    #[test]
    fn test_handshake_messages_are_not_published() {
        let (bridge, transport) = bridge_with_memory();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _sub = bridge.subscribe_all(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        transport.inject(&inbound("PING", "p", None));
        transport.inject(&inbound("UI_READY", "u", None));
        transport.inject(&inbound("CUSTOM", "c", None));

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_typed_subscriber_receives_payload() {
        let (bridge, transport) = bridge_with_memory();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let _sub = bridge.subscribe("SELECTION_CHANGED", move |env| {
            sink.lock().push(env.payload.clone());
        });

        transport.inject(&inbound("SELECTION_CHANGED", "s", Some(json!({"count": 2}))));
        transport.inject(&inbound("OTHER", "o", None));

        assert_eq!(*received.lock(), vec![Some(json!({"count": 2}))]);
    }

    #[test]
    fn test_disposed_subscription_stops_delivery() {
        let (bridge, transport) = bridge_with_memory();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let sub = bridge.subscribe("EVT", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        transport.inject(&inbound("EVT", "1", None));
        sub.dispose();
        transport.inject(&inbound("EVT", "2", None));

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_inbound_is_dropped() {
        let (bridge, transport) = bridge_with_memory();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _tap = bridge.on_inbound(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        transport.inject("not json");
        transport.inject(r#"{"payload": 1}"#);

        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert!(transport.posted().is_empty());
    }

    #[test]
    fn test_taps_see_both_directions() {
        let (bridge, transport) = bridge_with_memory();
        let log = Arc::new(Mutex::new(Vec::new()));
        let out_log = Arc::clone(&log);
        let in_log = Arc::clone(&log);
        let _out = bridge.on_outbound(move |env| {
            out_log.lock().push(format!("out:{}", env.message_type));
        });
        let _in = bridge.on_inbound(move |env| {
            in_log.lock().push(format!("in:{}", env.message_type));
        });

        transport.inject(&inbound("PING", "p", None));

        assert_eq!(*log.lock(), vec!["in:PING", "out:PONG"]);
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    #[test]
    fn test_reinitialize_disposes_previous_transport() {
        let (bridge, first) = bridge_with_memory();
        let second = MemoryTransport::new();

        bridge.initialize(Arc::new(second.clone()));

        assert!(first.is_disposed());
        assert_eq!(first.handler_count(), 0);
        assert_eq!(second.handler_count(), 1);
    }

    #[test]
    fn test_reinitialize_with_same_transport_keeps_it_alive() {
        let transport: Arc<dyn Transport> = Arc::new(MemoryTransport::new());
        let bridge = Bridge::new(BridgeSettings::default());

        bridge.initialize(Arc::clone(&transport));
        bridge.initialize(Arc::clone(&transport));

        assert!(bridge.send("X", None).is_ok());
    }

    #[test]
    fn test_shutdown_unhooks_and_disposes_transport() {
        // Arrange
        let mut mock = MockTransport::new();
        mock.expect_add_message_handler()
            .times(1)
            .returning(|_| HandlerId(3));
        mock.expect_remove_message_handler()
            .withf(|id| *id == HandlerId(3))
            .times(1)
            .return_const(());
        mock.expect_dispose().times(1).return_const(());
        let bridge = Bridge::new(BridgeSettings::default());
        bridge.initialize(Arc::new(mock));

        // Act
        bridge.shutdown();

        // Assert
        assert!(!bridge.is_initialized());
        assert!(matches!(bridge.send("X", None), Err(BridgeError::NotInitialized)));
    }
}
