//! # wsmock
//!
//! An in-process stand-in for the WebSocket client, for tests and local
//! development.
//!
//! Application code constructs a [`ws::WebSocket`] exactly as it would a real
//! client. Whether the connection opens is decided by an interception
//! operator: only destinations registered with [`intercept::Context::link`]
//! open; every other client is closed with code 1000 and an error is logged.
//! The operator injects traffic through the returned [`intercept::Link`], and
//! the payload reaches every client of that destination in every context
//! sharing the same [`intercept::Bridge`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsmock::intercept::{Bridge, Context};
//! use wsmock::base::ReadyState;
//! use wsmock::ws::EventType;
//!
//! let bridge = Bridge::new();
//! let tab = Context::new(&bridge);
//! let link = tab.link("wss://api.example.com/feed");
//!
//! let ws = tab.connect("wss://api.example.com/feed")?;
//! ws.add_event_listener(EventType::Message, |ev| println!("got {:?}", ev.data()));
//! tab.run_until_idle();
//! assert_eq!(ws.ready_state(), ReadyState::Open);
//!
//! link.send("tick");
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Ready states and error definitions
//! - [`ws`] - The mock client, its events and payloads
//! - [`intercept`] - Registry, execution contexts, the cross-context bridge and links
//! - [`env`] - Process-wide installation

pub mod base;
pub mod env;
pub mod intercept;
pub mod ws;
