use thiserror::Error;

/// Errors surfaced synchronously by the mock client.
///
/// Each variant maps onto the DOMException the platform client raises for
/// the same condition, see [`WsError::name`] and [`WsError::code`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum WsError {
    // Construction errors
    #[error("Failed to construct 'WebSocket': The URL '{url}' is invalid.")]
    InvalidUrl { url: String },
    #[error(
        "Failed to construct 'WebSocket': The URL's scheme must be either 'ws' or 'wss'. '{scheme}:' is not allowed."
    )]
    DisallowedScheme { scheme: String },
    #[error(
        "Failed to construct 'WebSocket': The URL contains a fragment identifier ('#{fragment}'). Fragment identifiers are not allowed in WebSocket URLs."
    )]
    UrlFragment { fragment: String },

    // Method errors
    #[error("Failed to execute 'send' on 'WebSocket': Still in CONNECTING state.")]
    InvalidState,
    #[error("Failed to execute 'close' on 'WebSocket': The close code {code} is out of the user configurable range.")]
    InvalidAccess { code: u16 },
}

impl WsError {
    /// DOMException name for this error.
    pub fn name(&self) -> &'static str {
        match self {
            WsError::InvalidUrl { .. }
            | WsError::DisallowedScheme { .. }
            | WsError::UrlFragment { .. } => "SyntaxError",
            WsError::InvalidState => "InvalidStateError",
            WsError::InvalidAccess { .. } => "InvalidAccessError",
        }
    }

    /// Legacy DOMException code for this error.
    pub fn code(&self) -> u16 {
        match self {
            WsError::InvalidUrl { .. }
            | WsError::DisallowedScheme { .. }
            | WsError::UrlFragment { .. } => 12,
            WsError::InvalidState => 11,
            WsError::InvalidAccess { .. } => 15,
        }
    }

    /// Whether the error was raised while constructing a client.
    pub fn is_construction_error(&self) -> bool {
        self.name() == "SyntaxError"
    }
}
