//! Cross-context broadcast bridge.
//!
//! Every [`Context`](super::Context) created from the same bridge holds an
//! unbounded inbox on it. Payloads an operator sends in one context reach
//! every other live context in send order, which replays them to its local
//! clients. Nothing is dropped when a context is slow to pump its inbox.

use crate::base::lock;
use crate::ws::Message;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::mpsc;

/// Identifies one execution context on a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// A payload in flight between contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeFrame {
    /// Context that published the frame; it never replays its own frames.
    pub origin: ContextId,
    /// Normalized destination the payload is addressed to.
    pub destination: String,
    pub data: Message,
}

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Channel name, for diagnostics
    pub name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            name: "ws-channel".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the channel name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A named fan-out channel shared by execution contexts.
#[derive(Clone)]
pub struct Bridge {
    name: Arc<str>,
    // one inbox per attached context; closed inboxes are pruned on publish
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<BridgeFrame>>>>,
    next_context: Arc<AtomicU64>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    /// Create a bridge with the default config.
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        Self {
            name: Arc::from(config.name),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_context: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The process-wide bridge.
    pub fn global() -> &'static Bridge {
        static GLOBAL: OnceLock<Bridge> = OnceLock::new();
        GLOBAL.get_or_init(Bridge::new)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of contexts currently listening.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers)
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }

    pub(crate) fn allocate_context_id(&self) -> ContextId {
        ContextId(self.next_context.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<BridgeFrame> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    /// Publish a frame to every subscriber. Returns how many received it.
    ///
    /// Subscribers whose context is gone are dropped from the bridge.
    pub fn publish(&self, frame: BridgeFrame) -> usize {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|sender| sender.send(frame.clone()).is_ok());
        let delivered = subscribers.len();
        drop(subscribers);

        tracing::debug!(
            channel = %self.name,
            destination = %frame.destination,
            subscribers = delivered,
            "bridge frame published"
        );
        delivered
    }
}
