//! Events delivered to mock clients.

use super::message::{CloseCode, Message};
use std::fmt;

/// The four event types a client dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Open,
    Message,
    Close,
    Error,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Open => "open",
            EventType::Message => "message",
            EventType::Close => "close",
            EventType::Error => "error",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The "closed" event: code, reason and whether the close was clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    pub code: CloseCode,
    pub reason: String,
    pub was_clean: bool,
}

impl CloseEvent {
    /// Build a close event. `was_clean` is inferred from the code.
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            was_clean: code.is_clean(),
        }
    }

    /// A clean close with code 1000 and no reason.
    pub fn normal() -> Self {
        Self::new(CloseCode::NORMAL, "")
    }
}

/// An event carrying a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub data: Message,
}

/// An event as seen by listeners.
///
/// Listeners receive `&Event`. When the registry fans out one message, every
/// client gets a reference to the same value, so listeners must treat it as
/// read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open,
    Message(MessageEvent),
    Close(CloseEvent),
    Error,
}

impl Event {
    /// Build an event of `kind` carrying `data`.
    ///
    /// Only message events keep the payload. Open and error events have no
    /// data slot and ignore it; a close event ignores it as well and is the
    /// normal close (code 1000, no reason, clean).
    pub fn with_payload(kind: EventType, data: Message) -> Self {
        match kind {
            EventType::Message => Event::Message(MessageEvent { data }),
            EventType::Open => Event::Open,
            EventType::Close => Event::Close(CloseEvent::normal()),
            EventType::Error => Event::Error,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Event::Open => EventType::Open,
            Event::Message(_) => EventType::Message,
            Event::Close(_) => EventType::Close,
            Event::Error => EventType::Error,
        }
    }

    pub fn data(&self) -> Option<&Message> {
        match self {
            Event::Message(ev) => Some(&ev.data),
            _ => None,
        }
    }

    pub fn as_close(&self) -> Option<&CloseEvent> {
        match self {
            Event::Close(ev) => Some(ev),
            _ => None,
        }
    }
}

impl From<CloseEvent> for Event {
    fn from(ev: CloseEvent) -> Self {
        Event::Close(ev)
    }
}
