//! Route guard layer.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every navigation (every CLI command) names a `Route`. Its `Guard` is
//! evaluated against the session snapshot taken at that moment, never a
//! cached decision, so hydration and logout are reflected immediately.
//!
//! DESIGN
//! ======
//! Guards are pure functions of `(guard, requested, state)`. Protected routes
//! drop the requested destination when redirecting to login; there is no
//! return-to handling.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

use std::fmt;

use crate::net::types::Role;
use crate::state::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Reports,
    Users,
    Branches,
}

impl Route {
    /// Where a signed-in user lands when sent away from the login view.
    pub const LANDING: Self = Self::Dashboard;

    pub const ALL: [Self; 5] = [Self::Login, Self::Dashboard, Self::Reports, Self::Users, Self::Branches];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/",
            Self::Reports => "/reports",
            Self::Users => "/users",
            Self::Branches => "/branches",
        }
    }

    /// Exact path match; a single trailing slash is tolerated.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = match path.strip_suffix('/') {
            Some("") | None => path,
            Some(rest) => rest,
        };
        Self::ALL.into_iter().find(|route| route.path() == trimmed)
    }

    #[must_use]
    pub fn guard(self) -> Guard {
        match self {
            Self::Login => Guard::PublicOnly,
            Self::Dashboard | Self::Reports | Self::Users | Self::Branches => Guard::Protected,
        }
    }

    /// Whether the navigation entry for this route is offered to `role`.
    /// Local gating only; the server still decides with 403.
    #[must_use]
    pub fn visible_to(self, role: Role) -> bool {
        match self {
            Self::Users => role.can_manage_users(),
            Self::Branches => role.can_manage_branches(),
            Self::Login | Self::Dashboard | Self::Reports => true,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Requires a signed-in user.
    Protected,
    /// Only for signed-out users (the login view).
    PublicOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Hydration still running; show a neutral waiting indicator.
    Wait,
    Redirect(Route),
    Render(Route),
}

/// Decide what a navigation to `requested` under `guard` should do.
#[must_use]
pub fn evaluate(guard: Guard, requested: Route, state: &SessionState) -> GuardOutcome {
    if state.loading {
        return GuardOutcome::Wait;
    }
    match (guard, state.is_authenticated()) {
        (Guard::Protected, false) => GuardOutcome::Redirect(Route::Login),
        (Guard::PublicOnly, true) => GuardOutcome::Redirect(Route::LANDING),
        _ => GuardOutcome::Render(requested),
    }
}

/// Evaluate `route` under its own guard.
#[must_use]
pub fn resolve(route: Route, state: &SessionState) -> GuardOutcome {
    evaluate(route.guard(), route, state)
}

/// Resolve a raw path. `None` means no such route.
#[must_use]
pub fn resolve_path(path: &str, state: &SessionState) -> Option<GuardOutcome> {
    Route::parse(path).map(|route| resolve(route, state))
}
