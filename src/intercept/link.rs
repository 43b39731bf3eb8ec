//! The operator's handle on an intercepted destination.

use super::bridge::BridgeFrame;
use super::context::Context;
use crate::ws::{EventType, Message, WebSocket};
use std::sync::Arc;

/// Returned by [`Context::link`]. Injects traffic into every client of the
/// destination, in this context and in every other context on the bridge.
#[derive(Clone, Debug)]
pub struct Link {
    context: Context,
    destination: String,
}

impl Link {
    pub(crate) fn new(context: Context, destination: String) -> Self {
        Self { context, destination }
    }

    /// The normalized destination this link intercepts.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Deliver a message event to every client of the destination.
    ///
    /// The payload is published on the bridge for the other contexts and
    /// dispatched to local clients right away, since the bridge never echoes
    /// a frame back to its origin. Returns the number of local clients reached.
    pub fn send(&self, data: impl Into<Message>) -> usize {
        let data = data.into();
        self.context.publish(BridgeFrame {
            origin: self.context.id(),
            destination: self.destination.clone(),
            data: data.clone(),
        });
        self.context
            .registry()
            .dispatch_global_event(&self.destination, EventType::Message, data)
    }

    /// Observe payloads that open clients of this destination send.
    pub fn on_client_message<F>(&self, hook: F)
    where
        F: Fn(&WebSocket, &Message) + Send + Sync + 'static,
    {
        self.context
            .registry()
            .add_client_message_hook(&self.destination, Arc::new(hook));
    }

    /// Clients of this destination currently registered in this context.
    pub fn clients(&self) -> Vec<WebSocket> {
        self.context.registry().lookup_sockets(&self.destination)
    }
}
