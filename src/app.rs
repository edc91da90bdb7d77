//! Process bootstrap.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `App` per process: it builds the session store, the HTTP gateway,
//! and the session manager, then subscribes a `SessionInvalidator` to the
//! gateway's 401s. Front ends call `start` once, then `navigate` before each
//! view or command.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use serde::Serialize;

use crate::config::ClientConfig;
use crate::navigation::{RestartSignal, SessionInvalidator};
use crate::net::client::ApiClient;
use crate::net::error::ApiError;
use crate::net::types::{DailyReport, Pagination, ReportQuery, UserProfile};
use crate::routes::{GuardOutcome, Route, resolve};
use crate::state::session::{SessionManager, SessionState};
use crate::state::store::{FileStorage, KeyValueStorage, SessionStore};

/// How many of the user's own reports the dashboard shows.
pub const RECENT_REPORTS_LIMIT: u32 = 5;

/// Landing view: the signed-in user and their latest reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub user: UserProfile,
    pub recent_reports: Vec<DailyReport>,
}

#[derive(Clone)]
pub struct App {
    pub config: ClientConfig,
    pub client: ApiClient,
    pub session: SessionManager,
    pub restart: RestartSignal,
}

impl App {
    /// Wire every component over the given storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, storage: Arc<dyn KeyValueStorage>) -> Result<Self, ApiError> {
        let store = SessionStore::new(storage);
        let client = ApiClient::new(&config, Arc::new(store.clone()))?;
        let session = SessionManager::new(Arc::new(client.clone()), store);
        let restart = RestartSignal::new();

        client.on_unauthorized(Arc::new(SessionInvalidator::new(
            session.invalidation(),
            Arc::new(restart.clone()),
        )));

        Ok(Self { config, client, session, restart })
    }

    /// Like [`App::new`], persisting the session at `config.session_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self, ApiError> {
        let storage = Arc::new(FileStorage::new(config.session_file.clone()));
        Self::new(config, storage)
    }

    /// Hydrate the session. Safe to call more than once.
    pub async fn start(&self) -> SessionState {
        self.session.hydrate().await
    }

    /// Guard decision for `route` against the current session.
    #[must_use]
    pub fn navigate(&self, route: Route) -> GuardOutcome {
        let outcome = resolve(route, &self.session.snapshot());
        tracing::debug!(%route, ?outcome, "navigation");
        outcome
    }

    /// Load the landing view. `None` when nobody is signed in.
    ///
    /// # Errors
    ///
    /// Propagates the report listing failure.
    pub async fn dashboard(&self) -> Result<Option<Dashboard>, ApiError> {
        let Some(user) = self.session.snapshot().user else {
            return Ok(None);
        };
        let query = ReportQuery {
            user_id: Some(user.id),
            page: Pagination { skip: None, limit: Some(RECENT_REPORTS_LIMIT) },
            ..ReportQuery::default()
        };
        let recent_reports = self.client.list_reports(&query).await?;
        Ok(Some(Dashboard { user, recent_reports }))
    }
}
