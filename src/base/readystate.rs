/// The connection state of a mock client.
/// Values match the platform's `WebSocket.readyState` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum ReadyState {
    /// Constructed, waiting for the settle step.
    #[default]
    Connecting = 0,

    /// A link matched and the open event fired.
    Open = 1,

    /// `close()` was called; no further dispatch reaches the client.
    Closing = 2,

    /// Terminal state.
    Closed = 3,
}

impl ReadyState {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Whether late sends are absorbed into `bufferedAmount`.
    pub fn is_closing_or_closed(self) -> bool {
        matches!(self, ReadyState::Closing | ReadyState::Closed)
    }

    /// States only ever advance: `Connecting -> Open -> Closing -> Closed`,
    /// with `Connecting -> Closed` and `Connecting -> Closing` as shortcuts.
    pub fn can_advance_to(self, next: ReadyState) -> bool {
        next > self
    }
}

impl From<ReadyState> for u16 {
    fn from(state: ReadyState) -> Self {
        state.as_u16()
    }
}
