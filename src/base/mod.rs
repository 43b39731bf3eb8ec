//! Base types and error handling.
//!
//! - [`WsError`]: synchronous construction and method errors
//! - [`ReadyState`]: the client connection states

pub mod readystate;
pub mod wserror;

pub use readystate::ReadyState;
pub use wserror::WsError;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a listener panicked while it was held.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
