//! WebSocket payload and close code types.

use bytes::Bytes;
use serde::Serialize;

/// A payload carried by a send or a message event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Text message (UTF-8)
    Text(String),
    /// Binary message
    Binary(Bytes),
}

impl Message {
    /// Serialize a value into a text message.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string(value).map(Message::Text)
    }

    /// Check if this is a text message.
    pub fn is_text(&self) -> bool {
        matches!(self, Message::Text(_))
    }

    /// Check if this is a binary message.
    pub fn is_binary(&self) -> bool {
        matches!(self, Message::Binary(_))
    }

    /// Try to get as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(s) => Some(s),
            Message::Binary(_) => None,
        }
    }

    /// Try to get as binary data.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Message::Binary(b) => Some(b),
            Message::Text(_) => None,
        }
    }

    /// Measured length used for `bufferedAmount`.
    ///
    /// Text counts UTF-16 code units, binary counts bytes.
    pub fn len(&self) -> u64 {
        match self {
            Message::Text(s) => s.encode_utf16().count() as u64,
            Message::Binary(b) => b.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to bytes (text as UTF-8, binary as-is).
    pub fn into_data(self) -> Vec<u8> {
        match self {
            Message::Text(s) => s.into_bytes(),
            Message::Binary(b) => b.to_vec(),
        }
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_owned())
    }
}

impl From<Bytes> for Message {
    fn from(data: Bytes) -> Self {
        Message::Binary(data)
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Self {
        Message::Binary(Bytes::from(data))
    }
}

/// WebSocket close codes (RFC 6455).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// Normal closure
    pub const NORMAL: Self = Self(1000);
    /// Server going down
    pub const GOING_AWAY: Self = Self(1001);
    /// Protocol error
    pub const PROTOCOL_ERROR: Self = Self(1002);
    /// Abnormal closure
    pub const ABNORMAL: Self = Self(1006);

    /// Codes an application may pass to `close()`: exactly 1000, or 3000-4999.
    pub fn is_user_closable(self) -> bool {
        self.0 == 1000 || (3000..5000).contains(&self.0)
    }

    /// A close is clean only for normal closure.
    pub fn is_clean(self) -> bool {
        self == Self::NORMAL
    }
}

impl Default for CloseCode {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

/// How binary messages are exposed to listeners. Stored only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryType {
    #[default]
    Blob,
    ArrayBuffer,
}
