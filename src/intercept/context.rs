//! One execution context: a registry, a task queue and a bridge subscription.

use super::bridge::{Bridge, BridgeFrame, ContextId};
use super::link::Link;
use super::registry::Registry;
use super::scheduler::Scheduler;
use crate::base::WsError;
use crate::ws::{EventType, WebSocket};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, Mutex};
use url::Url;

struct ContextInner {
    id: ContextId,
    registry: Arc<Registry>,
    scheduler: Scheduler,
    bridge: Bridge,
    inbox: Mutex<mpsc::UnboundedReceiver<BridgeFrame>>,
}

/// A single-threaded execution context, the equivalent of one browser tab.
///
/// Clients and links are created through a context. Deferred steps (opening,
/// closing) and frames from other contexts are processed only when the context
/// is pumped with [`run_until_idle`](Self::run_until_idle) or driven by
/// [`run`](Self::run).
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("bridge", &self.inner.bridge.name())
            .field("registry", &self.inner.registry)
            .field("pending_tasks", &self.inner.scheduler.pending())
            .finish()
    }
}

impl Context {
    /// Attach a new context to a bridge.
    pub fn new(bridge: &Bridge) -> Self {
        Self::with_registry(bridge, Arc::new(Registry::new()))
    }

    /// Attach a new context that uses an existing registry.
    pub fn with_registry(bridge: &Bridge, registry: Arc<Registry>) -> Self {
        let id = bridge.allocate_context_id();
        tracing::debug!(context = %id, channel = %bridge.name(), "context attached");
        Self {
            inner: Arc::new(ContextInner {
                id,
                registry,
                scheduler: Scheduler::new(),
                bridge: bridge.clone(),
                inbox: Mutex::new(bridge.subscribe()),
            }),
        }
    }

    /// A context on its own private bridge.
    pub fn isolated() -> Self {
        Self::new(&Bridge::new())
    }

    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    pub fn bridge(&self) -> &Bridge {
        &self.inner.bridge
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Intercept every client constructed against `destination`.
    pub fn link(&self, destination: &str) -> Link {
        let destination = normalize_destination(destination);
        self.inner.registry.add_link(&destination);
        tracing::debug!(context = %self.inner.id, destination = %destination, "link added");
        Link::new(self.clone(), destination)
    }

    /// Construct a mock client in this context.
    pub fn connect(&self, url: &str) -> Result<WebSocket, WsError> {
        WebSocket::new(self, url)
    }

    /// Run queued tasks and pending bridge frames until none are left.
    ///
    /// Returns how many tasks and frames were processed.
    pub fn run_until_idle(&self) -> usize {
        let mut processed = 0;
        loop {
            let before = processed;

            while let Some(task) = self.inner.scheduler.next_task() {
                task();
                processed += 1;
            }

            while let Some(frame) = self.try_next_frame() {
                self.handle_frame(frame);
                processed += 1;
            }

            if processed == before {
                return processed;
            }
        }
    }

    /// Pump this context on the current runtime.
    ///
    /// Returns once the bridge stops delivering to this context; otherwise it
    /// runs until the surrounding task is dropped.
    pub async fn run(&self) {
        loop {
            self.run_until_idle();

            let next = {
                let mut inbox = self.inner.inbox.lock().await;
                tokio::select! {
                    _ = self.inner.scheduler.notified() => None,
                    frame = inbox.recv() => Some(frame),
                }
            };

            match next {
                None => {}
                Some(Some(frame)) => self.handle_frame(frame),
                Some(None) => {
                    tracing::debug!(context = %self.inner.id, "bridge inbox closed, stopping");
                    return;
                }
            }
        }
    }

    /// Publish a payload to the other contexts on the bridge.
    pub(crate) fn publish(&self, frame: BridgeFrame) -> usize {
        self.inner.bridge.publish(frame)
    }

    fn try_next_frame(&self) -> Option<BridgeFrame> {
        // `run` holds the inbox while waiting; it will deliver the frame itself.
        let mut inbox = self.inner.inbox.try_lock().ok()?;
        match inbox.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn handle_frame(&self, frame: BridgeFrame) {
        if frame.origin == self.inner.id {
            return;
        }
        if !self.inner.registry.lookup_link(&frame.destination) {
            tracing::debug!(
                context = %self.inner.id,
                destination = %frame.destination,
                "bridge frame for unlinked destination ignored"
            );
            return;
        }

        let delivered =
            self.inner
                .registry
                .dispatch_global_event(&frame.destination, EventType::Message, frame.data);
        tracing::debug!(
            context = %self.inner.id,
            origin = %frame.origin,
            destination = %frame.destination,
            delivered,
            "bridge frame replayed"
        );
    }
}

/// Serialize a destination the way client URLs are serialized.
///
/// Strings that do not parse as URLs are kept verbatim.
pub fn normalize_destination(destination: &str) -> String {
    Url::parse(destination)
        .map(String::from)
        .unwrap_or_else(|_| destination.to_owned())
}
