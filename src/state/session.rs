//! Auth session manager: the in-memory view of who is signed in.
//!
//! SYSTEM CONTEXT
//! ==============
//! Constructed once per process by `App` with an injected `AuthBackend` and
//! `SessionStore`. Route guards read [`SessionManager::snapshot`] on every
//! navigation; nothing else mutates the state except `hydrate`, `login`,
//! `logout`, and the 401 path through [`SessionInvalidation`].
//!
//! DESIGN
//! ======
//! Hydration is optimistic: a stored credential makes the cached profile
//! visible immediately while `loading` stays true, then `/me` decides. On
//! success the server copy replaces the cache; on any failure the store is
//! cleared and the session ends unauthenticated.
//!
//! TRADE-OFFS
//! ==========
//! State sits behind a `std::sync::RwLock` rather than an async lock because
//! the 401 subscriber runs synchronously inside the HTTP gateway. No guard is
//! ever held across an `.await`.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::store::{SessionStore, StoreError};
use crate::net::api::AuthBackend;
use crate::net::error::ApiError;
use crate::net::types::{Credential, LoginRequest, UserProfile};

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub loading: bool,
}

impl SessionState {
    /// State at process start, before hydration has run.
    #[must_use]
    pub fn initializing() -> Self {
        Self { user: None, loading: true }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { user: None, loading: false }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (self.loading, &self.user) {
            (true, _) => SessionPhase::Initializing,
            (false, None) => SessionPhase::Unauthenticated,
            (false, Some(_)) => SessionPhase::Authenticated,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initializing()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Initializing,
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

type SharedState = Arc<RwLock<SessionState>>;

fn write_state(state: &SharedState, next: SessionState) {
    *state.write().unwrap_or_else(PoisonError::into_inner) = next;
}

// =============================================================================
// INVALIDATION
// =============================================================================

/// Handle that tears the session down without owning the backend.
///
/// Held by the 401 subscriber; keeping the backend out of it avoids a
/// reference cycle with the HTTP client that notifies it.
#[derive(Clone)]
pub struct SessionInvalidation {
    store: SessionStore,
    state: SharedState,
}

impl SessionInvalidation {
    /// Clear the persisted credential, then the in-memory session.
    ///
    /// Storage failures are logged; the in-memory session ends regardless.
    pub fn invalidate(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "failed to clear stored credential");
        }
        write_state(&self.state, SessionState::signed_out());
    }
}

// =============================================================================
// MANAGER
// =============================================================================

#[derive(Clone)]
pub struct SessionManager {
    backend: Arc<dyn AuthBackend>,
    store: SessionStore,
    state: SharedState,
    hydration_started: Arc<AtomicBool>,
}

impl SessionManager {
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>, store: SessionStore) -> Self {
        Self {
            backend,
            store,
            state: Arc::new(RwLock::new(SessionState::initializing())),
            hydration_started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Copy of the current state. Cheap enough to take per navigation.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn invalidation(&self) -> SessionInvalidation {
        SessionInvalidation { store: self.store.clone(), state: self.state.clone() }
    }

    /// Rebuild the session from the store and verify it with the server.
    ///
    /// Runs at most once per manager; later calls return the current
    /// snapshot without touching the store or the network.
    pub async fn hydrate(&self) -> SessionState {
        if self.hydration_started.swap(true, Ordering::SeqCst) {
            tracing::debug!("hydration already ran; skipping");
            return self.snapshot();
        }

        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored session");
                None
            }
        };

        let Some(credential) = stored else {
            // Drop any half-written pair so token and profile stay in step.
            if let Err(e) = self.store.clear() {
                tracing::warn!(error = %e, "could not clear partial session");
            }
            write_state(&self.state, SessionState::signed_out());
            tracing::info!("no stored session");
            return self.snapshot();
        };

        write_state(&self.state, SessionState { user: Some(credential.user), loading: true });

        match self.backend.current_user().await {
            Ok(user) => self.reconcile(user),
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "stored credential rejected");
                self.invalidation().invalidate();
            }
        }
        self.snapshot()
    }

    fn reconcile(&self, user: UserProfile) {
        match self.store.refresh_profile(&user) {
            Ok(true) => {
                tracing::info!(user_id = user.id, role = %user.role, "session restored");
                write_state(&self.state, SessionState { user: Some(user), loading: false });
            }
            Ok(false) => {
                // Token was cleared while /me was in flight.
                tracing::info!("stored token vanished during verification");
                write_state(&self.state, SessionState::signed_out());
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not cache refreshed profile");
                write_state(&self.state, SessionState { user: Some(user), loading: false });
            }
        }
    }

    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns the backend error (typically `InvalidCredentials`) or a store
    /// error. Either way the in-memory state and the store are left as they
    /// were.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<UserProfile, SessionError> {
        let response = self.backend.login(credentials).await?;
        let credential = Credential::from(response);
        self.store.persist(&credential)?;

        tracing::info!(user_id = credential.user.id, role = %credential.user.role, "signed in");
        write_state(&self.state, SessionState { user: Some(credential.user.clone()), loading: false });
        Ok(credential.user)
    }

    /// End the session. The server call is best-effort; local teardown
    /// always happens.
    pub async fn logout(&self) {
        if let Err(e) = self.backend.logout().await {
            tracing::warn!(error = %e, code = e.error_code(), "server logout failed; clearing local session anyway");
        }
        self.invalidation().invalidate();
        tracing::info!("signed out");
    }
}
