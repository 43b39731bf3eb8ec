//! Process-wide installation.
//!
//! Application code that cannot receive a [`Context`] explicitly constructs
//! clients through [`connect`] and links destinations through [`link`]. Both
//! use the context installed here, installing a default one on the global
//! bridge the first time either is used.

use crate::base::WsError;
use crate::intercept::{Bridge, Context, Link};
use crate::ws::WebSocket;
use std::sync::OnceLock;

static INSTALLED: OnceLock<Context> = OnceLock::new();

/// Install `context` as the process-wide context.
///
/// Only the first installation takes effect; later calls return false and
/// leave the installed context in place. [`connect`], [`link`] and
/// [`context`] install a default context when nothing was installed yet, so
/// call this before any of them.
pub fn install(context: Context) -> bool {
    let mut installed = false;
    INSTALLED.get_or_init(|| {
        installed = true;
        context
    });

    if installed {
        tracing::debug!("process-wide context installed");
    } else {
        tracing::debug!("process-wide context already installed, ignoring");
    }
    installed
}

/// Whether a process-wide context has been installed, either explicitly or
/// implicitly by the first [`connect`], [`link`] or [`context`] call.
pub fn is_patched() -> bool {
    INSTALLED.get().is_some()
}

/// The installed context, installing a default one if needed.
pub fn context() -> &'static Context {
    INSTALLED.get_or_init(|| {
        tracing::debug!("no process-wide context installed, using a default one on the global bridge");
        Context::new(Bridge::global())
    })
}

/// Construct a client through the installed context.
pub fn connect(url: &str) -> Result<WebSocket, WsError> {
    context().connect(url)
}

/// Link a destination in the installed context.
pub fn link(destination: &str) -> Link {
    context().link(destination)
}
