//! Interception plumbing.
//!
//! - [`Registry`]: intercepted destinations and live clients
//! - [`Context`]: one execution context with its registry and task queue
//! - [`Bridge`]: fan-out channel relaying operator payloads across contexts
//! - [`Link`]: the operator handle returned by [`Context::link`]

mod bridge;
mod context;
mod link;
mod registry;
mod scheduler;

pub use bridge::{Bridge, BridgeConfig, BridgeFrame, ContextId};
pub use context::{normalize_destination, Context};
pub use link::Link;
pub use registry::{ClientMessageHook, Registry};
pub(crate) use scheduler::Scheduler;
