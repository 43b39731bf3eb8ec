//! Registry of interception links and live mock clients.
//!
//! One registry exists per [`Context`](super::Context). Keys are compared as
//! exact strings; callers normalize destinations before using them.

use crate::ws::{Event, EventType, Message, WebSocket};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// Operator callback invoked when an open client sends a payload.
pub type ClientMessageHook = Arc<dyn Fn(&WebSocket, &Message) + Send + Sync>;

/// Tracks intercepted destinations and the clients constructed against them.
///
/// The registry shares clients, it never constructs or closes one.
#[derive(Default)]
pub struct Registry {
    // destination -> number of times it was linked
    links: DashMap<String, usize>,
    // destination -> clients in registration order
    sockets: DashMap<String, Vec<WebSocket>>,
    hooks: DashMap<String, Vec<ClientMessageHook>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("links", &self.links.len())
            .field("sockets", &self.socket_count())
            .finish()
    }
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a destination as intercepted. Linking twice is harmless.
    pub fn add_link(&self, destination: &str) {
        *self.links.entry(destination.to_owned()).or_insert(0) += 1;
    }

    /// Whether any link exists for the destination.
    pub fn lookup_link(&self, destination: &str) -> bool {
        self.links.contains_key(destination)
    }

    /// Register a client under a destination.
    pub fn add_socket(&self, socket: &WebSocket, destination: &str) {
        self.sockets
            .entry(destination.to_owned())
            .or_default()
            .push(socket.clone());
        tracing::debug!(destination = %destination, "client registered");
    }

    /// Remove exactly this client from the destination. Siblings stay.
    pub fn remove_socket(&self, socket: &WebSocket, destination: &str) {
        if let Some(mut entry) = self.sockets.get_mut(destination) {
            let remaining: Vec<WebSocket> = entry
                .iter()
                .filter(|registered| !registered.ptr_eq(socket))
                .cloned()
                .collect();
            *entry = remaining;
        }
        self.sockets.remove_if(destination, |_, list| list.is_empty());
        tracing::debug!(destination = %destination, "client unregistered");
    }

    /// Clients registered for a destination, in registration order.
    ///
    /// Returns a snapshot; later registry changes do not affect it.
    pub fn lookup_sockets(&self, destination: &str) -> Vec<WebSocket> {
        self.sockets
            .get(destination)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Dispatch one event to every client of the destination.
    ///
    /// A single event value is built and handed to each client by reference.
    /// `data` is carried only by message events; see [`Event::with_payload`].
    /// Returns how many clients it was dispatched to.
    pub fn dispatch_global_event(&self, destination: &str, kind: EventType, data: Message) -> usize {
        let sockets = self.lookup_sockets(destination);
        let event = Event::with_payload(kind, data);

        for socket in &sockets {
            socket.dispatch_event(&event);
        }
        sockets.len()
    }

    /// Install an operator hook for payloads sent by open clients.
    pub fn add_client_message_hook(&self, destination: &str, hook: ClientMessageHook) {
        self.hooks.entry(destination.to_owned()).or_default().push(hook);
    }

    /// Hand a client's outgoing payload to the destination's hooks.
    /// Returns how many hooks saw it.
    pub fn forward_client_message(&self, socket: &WebSocket, destination: &str, data: &Message) -> usize {
        let hooks: Vec<ClientMessageHook> = self
            .hooks
            .get(destination)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        if hooks.is_empty() {
            tracing::trace!(destination = %destination, len = data.len(), "no hook for client message, dropping");
        }
        for hook in &hooks {
            hook(socket, data);
        }
        hooks.len()
    }

    /// Number of registered clients across all destinations.
    pub fn socket_count(&self) -> usize {
        self.sockets.iter().map(|entry| entry.len()).sum()
    }

    /// Number of distinct linked destinations.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Drop every link, registration and hook.
    pub fn reset(&self) {
        self.links.clear();
        self.sockets.clear();
        self.hooks.clear();
    }
}
