//! The mock WebSocket client.
//!
//! Constructed exactly like the platform client, but never opens a network
//! connection: a client opens only if its destination was linked in its
//! context, and otherwise closes with code 1000.

use super::event::{CloseEvent, Event, EventType};
use super::message::{BinaryType, CloseCode, Message};
use super::target::{EventTarget, Listener, ListenerId};
use crate::base::{lock, ReadyState, WsError};
use crate::intercept::{Context, Registry, Scheduler};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

struct Inner {
    url: Url,
    requested_protocols: Vec<String>,
    state: Mutex<ReadyState>,
    buffered_amount: AtomicU64,
    binary_type: Mutex<BinaryType>,
    target: EventTarget,
    registry: Arc<Registry>,
    scheduler: Scheduler,
}

/// Mock WebSocket client.
///
/// Cloning yields another handle to the same client; identity is by pointer.
#[derive(Clone)]
pub struct WebSocket {
    inner: Arc<Inner>,
}

impl fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocket")
            .field("url", &self.url())
            .field("ready_state", &self.ready_state())
            .field("buffered_amount", &self.buffered_amount())
            .finish()
    }
}

impl PartialEq for WebSocket {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for WebSocket {}

impl WebSocket {
    /// Construct a client in `context`.
    ///
    /// URL errors are returned before anything is registered or scheduled.
    /// The returned client is always `Connecting`; the open or close event
    /// fires on a later turn of the context.
    pub fn new(context: &Context, url: &str) -> Result<Self, WsError> {
        Self::with_protocols(context, url, Vec::<String>::new())
    }

    /// Construct a client declaring sub-protocols. They are stored, not negotiated.
    pub fn with_protocols<I, P>(context: &Context, url: &str, protocols: I) -> Result<Self, WsError>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let url = validate_url(url)?;
        let socket = Self {
            inner: Arc::new(Inner {
                url,
                requested_protocols: protocols.into_iter().map(Into::into).collect(),
                state: Mutex::new(ReadyState::Connecting),
                buffered_amount: AtomicU64::new(0),
                binary_type: Mutex::new(BinaryType::default()),
                target: EventTarget::new(),
                registry: Arc::clone(context.registry()),
                scheduler: context.scheduler().clone(),
            }),
        };

        // Registered before the link lookup, whatever its outcome.
        socket.inner.registry.add_socket(&socket, socket.url());

        if socket.inner.registry.lookup_link(socket.url()) {
            let pending = socket.clone();
            socket.inner.scheduler.defer(move || pending.settle_open());
        } else {
            tracing::error!(url = %socket.url(), "no link registered for this URL, closing the client");
            let pending = socket.clone();
            socket.inner.scheduler.defer(move || pending.settle_unlinked());
        }

        Ok(socket)
    }

    /// Start building a client.
    pub fn builder() -> WebSocketBuilder {
        WebSocketBuilder::new()
    }

    /// Serialized URL; also the registry key.
    pub fn url(&self) -> &str {
        self.inner.url.as_str()
    }

    /// Negotiated sub-protocol. Always empty.
    pub fn protocol(&self) -> &str {
        ""
    }

    /// Negotiated extensions. Always empty.
    pub fn extensions(&self) -> &str {
        ""
    }

    /// Sub-protocols passed at construction.
    pub fn requested_protocols(&self) -> &[String] {
        &self.inner.requested_protocols
    }

    pub fn ready_state(&self) -> ReadyState {
        *lock(&self.inner.state)
    }

    /// Measured length of everything sent after the client started closing.
    pub fn buffered_amount(&self) -> u64 {
        self.inner.buffered_amount.load(Ordering::SeqCst)
    }

    pub fn binary_type(&self) -> BinaryType {
        *lock(&self.inner.binary_type)
    }

    pub fn set_binary_type(&self, binary_type: BinaryType) {
        *lock(&self.inner.binary_type) = binary_type;
    }

    /// Whether both handles refer to the same client.
    pub fn ptr_eq(&self, other: &WebSocket) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Transmit data.
    ///
    /// - `Connecting`: the client is unregistered and `InvalidState` is returned.
    /// - `Closing`/`Closed`: nothing is sent; the payload length is added to
    ///   [`buffered_amount`](Self::buffered_amount).
    /// - `Open`: the payload goes to the operator hooks of the destination.
    pub fn send(&self, data: impl Into<Message>) -> Result<(), WsError> {
        let data = data.into();
        let state = self.ready_state();

        if state == ReadyState::Connecting {
            self.inner.registry.remove_socket(self, self.url());
            return Err(WsError::InvalidState);
        }

        if state.is_closing_or_closed() {
            self.inner.buffered_amount.fetch_add(data.len(), Ordering::SeqCst);
            return Ok(());
        }

        self.inner.registry.forward_client_message(self, self.url(), &data);
        Ok(())
    }

    /// Close with code 1000 and no reason.
    pub fn close(&self) -> Result<(), WsError> {
        self.close_with(CloseCode::NORMAL, "")
    }

    /// Close with a code and reason.
    ///
    /// The code must be 1000 or within 3000-4999. Closing an already closing
    /// or closed client does nothing. Otherwise the client moves to `Closing`,
    /// leaves the registry, gets exactly one close event, and settles to
    /// `Closed` on the next turn.
    pub fn close_with(&self, code: impl Into<CloseCode>, reason: &str) -> Result<(), WsError> {
        let code = code.into();
        if !code.is_user_closable() {
            return Err(WsError::InvalidAccess { code: code.0 });
        }

        if !self.advance(ReadyState::Closing) {
            return Ok(());
        }

        self.inner.registry.remove_socket(self, self.url());
        self.dispatch_event(&CloseEvent::new(code, reason).into());

        let pending = self.clone();
        self.inner.scheduler.defer(move || {
            pending.advance(ReadyState::Closed);
        });
        Ok(())
    }

    /// Append a listener. See [`EventTarget::add_event_listener`].
    pub fn add_event_listener<F>(&self, kind: EventType, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.target.add_event_listener(kind, listener)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.inner.target.remove_event_listener(id)
    }

    /// Deliver an event to this client's listeners.
    pub fn dispatch_event(&self, event: &Event) {
        self.inner.target.dispatch_event(event);
    }

    pub fn onopen(&self) -> Option<Listener> {
        self.inner.target.slot(EventType::Open)
    }

    pub fn set_onopen(&self, listener: Option<Listener>) {
        self.inner.target.set_slot(EventType::Open, listener);
    }

    pub fn onmessage(&self) -> Option<Listener> {
        self.inner.target.slot(EventType::Message)
    }

    pub fn set_onmessage(&self, listener: Option<Listener>) {
        self.inner.target.set_slot(EventType::Message, listener);
    }

    pub fn onclose(&self) -> Option<Listener> {
        self.inner.target.slot(EventType::Close)
    }

    pub fn set_onclose(&self, listener: Option<Listener>) {
        self.inner.target.set_slot(EventType::Close, listener);
    }

    pub fn onerror(&self) -> Option<Listener> {
        self.inner.target.slot(EventType::Error)
    }

    pub fn set_onerror(&self, listener: Option<Listener>) {
        self.inner.target.set_slot(EventType::Error, listener);
    }

    /// Move forward to `next`. Returns false (and changes nothing) if the
    /// client is already at or past it.
    fn advance(&self, next: ReadyState) -> bool {
        let mut state = lock(&self.inner.state);
        if !state.can_advance_to(next) {
            return false;
        }
        let from = *state;
        tracing::debug!(url = %self.url(), from = ?from, to = ?next, "ready state changed");
        *state = next;
        true
    }

    /// Move from exactly `from` to `to`.
    fn transition(&self, from: ReadyState, to: ReadyState) -> bool {
        let mut state = lock(&self.inner.state);
        if *state != from {
            return false;
        }
        tracing::debug!(url = %self.url(), from = ?from, to = ?to, "ready state changed");
        *state = to;
        true
    }

    // A close() before this turn already decided the outcome of both settles.
    fn settle_open(&self) {
        if self.transition(ReadyState::Connecting, ReadyState::Open) {
            self.dispatch_event(&Event::Open);
        }
    }

    fn settle_unlinked(&self) {
        if self.transition(ReadyState::Connecting, ReadyState::Closed) {
            self.inner.registry.remove_socket(self, self.url());
            self.dispatch_event(&CloseEvent::normal().into());
        }
    }
}

/// Parse and check a WebSocket URL the way the platform constructor does.
fn validate_url(raw: &str) -> Result<Url, WsError> {
    let url = Url::parse(raw).map_err(|_| WsError::InvalidUrl { url: raw.to_owned() })?;

    if url.scheme() != "ws" && url.scheme() != "wss" {
        return Err(WsError::DisallowedScheme {
            scheme: url.scheme().to_owned(),
        });
    }

    if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) {
        return Err(WsError::UrlFragment {
            fragment: fragment.to_owned(),
        });
    }

    Ok(url)
}

/// Mock client builder.
#[derive(Debug, Clone, Default)]
pub struct WebSocketBuilder {
    url: Option<Url>,
    protocols: Vec<String>,
}

impl WebSocketBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the URL, validating it up front.
    pub fn url(mut self, url: &str) -> Result<Self, WsError> {
        self.url = Some(validate_url(url)?);
        Ok(self)
    }

    /// Declare a sub-protocol.
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    /// Check if secure (wss://).
    pub fn is_secure(&self) -> bool {
        self.url.as_ref().is_some_and(|u| u.scheme() == "wss")
    }

    /// Construct the client in `context`.
    pub fn connect(self, context: &Context) -> Result<WebSocket, WsError> {
        let url = self.url.ok_or(WsError::InvalidUrl { url: String::new() })?;
        WebSocket::with_protocols(context, url.as_str(), self.protocols)
    }
}
