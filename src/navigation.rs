//! Forced navigation after a session dies.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionInvalidator` subscribes to 401s from the HTTP gateway. It clears
//! the stored credential and in-memory session first, then asks the
//! `Navigator` for a full restart at the login entry point. Both steps run
//! in the same synchronous call, so a restarted process can never read a
//! stale token.
//!
//! `RestartSignal` is the process-level navigator: it records one pending
//! restart and ignores further requests until that one is taken, which keeps
//! a burst of 401s from looping.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::sync::{Arc, Mutex, PoisonError};

use crate::net::client::UnauthorizedHandler;
use crate::routes::Route;
use crate::state::session::SessionInvalidation;

/// Performs a full restart of the application at `route`, discarding
/// in-memory state tied to the old session.
pub trait Navigator: Send + Sync {
    fn restart_at(&self, route: Route);
}

// =============================================================================
// RESTART SIGNAL
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RestartSignal {
    pending: Arc<Mutex<Option<Route>>>,
}

impl RestartSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The restart waiting to be honoured, if any.
    #[must_use]
    pub fn pending(&self) -> Option<Route> {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consume the pending restart. Later requests are accepted again.
    pub fn take(&self) -> Option<Route> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl Navigator for RestartSignal {
    fn restart_at(&self, route: Route) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match *pending {
            Some(existing) => {
                tracing::debug!(%existing, requested = %route, "restart already pending; ignoring");
            }
            None => {
                tracing::info!(%route, "restart requested");
                *pending = Some(route);
            }
        }
    }
}

// =============================================================================
// INVALIDATOR
// =============================================================================

/// 401 subscriber: tear down the session, then restart at login.
pub struct SessionInvalidator {
    invalidation: SessionInvalidation,
    navigator: Arc<dyn Navigator>,
}

impl SessionInvalidator {
    #[must_use]
    pub fn new(invalidation: SessionInvalidation, navigator: Arc<dyn Navigator>) -> Self {
        Self { invalidation, navigator }
    }
}

impl UnauthorizedHandler for SessionInvalidator {
    fn on_unauthorized(&self) {
        self.invalidation.invalidate();
        self.navigator.restart_at(Route::Login);
    }
}
