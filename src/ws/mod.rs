//! Mock WebSocket client.
//!
//! Mirrors the platform `WebSocket` surface: ready states, `send`/`close`,
//! multi-listener events and the single-slot `on*` handlers.
//!
//! # Example
//! ```ignore
//! use wsmock::intercept::Context;
//! use wsmock::ws::EventType;
//!
//! let ctx = Context::isolated();
//! let link = ctx.link("wss://echo.example.com");
//! let ws = ctx.connect("wss://echo.example.com")?;
//! ws.add_event_listener(EventType::Message, |ev| println!("{:?}", ev.data()));
//! ctx.run_until_idle();
//! link.send("hello");
//! ```

mod connection;
mod event;
mod message;
mod target;

pub use connection::{WebSocket, WebSocketBuilder};
pub use event::{CloseEvent, Event, EventType, MessageEvent};
pub use message::{BinaryType, CloseCode, Message};
pub use target::{EventTarget, Listener, ListenerId};
