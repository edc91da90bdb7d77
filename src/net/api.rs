//! Typed backend endpoints built on top of [`ApiClient`].
//!
//! Auth calls sit behind the `AuthBackend` trait so the session manager can
//! be driven by a mock in tests. Resource calls (branches, daily reports,
//! users) are plain methods; they carry no session logic of their own.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use super::client::{ApiClient, Method, SessionPolicy, to_body};
use super::error::ApiError;
use super::types::{
    Branch, BranchCreate, BranchUpdate, DailyReport, DailyReportCreate, DailyReportUpdate, LoginRequest,
    LoginResponse, Pagination, ReportQuery, UserCreate, UserProfile, UserUpdate,
};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const ME_PATH: &str = "/api/auth/me";

const BRANCHES_PATH: &str = "/api/branches";
const REPORTS_PATH: &str = "/api/daily-reports";
const USERS_PATH: &str = "/api/users";

fn item_path(collection: &str, id: i64) -> String {
    format!("{collection}/{id}")
}

// =============================================================================
// AUTH
// =============================================================================

/// Auth endpoints the session manager depends on.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange email/password for a token and profile.
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// Tell the server the session is over. Body is ignored.
    async fn logout(&self) -> Result<(), ApiError>;

    /// Fetch the profile for the current token.
    async fn current_user(&self) -> Result<UserProfile, ApiError>;
}

#[async_trait::async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let body = to_body(credentials)?;
        let response = self
            .send(Method::POST, LOGIN_PATH, Some(&body), &[], SessionPolicy::Anonymous)
            .await
            .map_err(ApiError::into_login_error)?;
        let parsed: LoginResponse = response.json()?;
        if !parsed.token_type.eq_ignore_ascii_case("bearer") {
            tracing::warn!(token_type = %parsed.token_type, "unexpected token type; sending as bearer anyway");
        }
        Ok(parsed)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.request(Method::POST, LOGOUT_PATH, None, &[]).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.get_json(ME_PATH, &[]).await
    }
}

// =============================================================================
// BRANCHES
// =============================================================================

impl ApiClient {
    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn list_branches(&self, page: Pagination) -> Result<Vec<Branch>, ApiError> {
        self.get_json(BRANCHES_PATH, &page.to_params()).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn get_branch(&self, id: i64) -> Result<Branch, ApiError> {
        self.get_json(&item_path(BRANCHES_PATH, id), &[]).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn create_branch(&self, branch: &BranchCreate) -> Result<Branch, ApiError> {
        self.post_json(BRANCHES_PATH, branch).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn update_branch(&self, id: i64, update: &BranchUpdate) -> Result<Branch, ApiError> {
        self.put_json(&item_path(BRANCHES_PATH, id), update).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn delete_branch(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&item_path(BRANCHES_PATH, id)).await
    }
}

// =============================================================================
// DAILY REPORTS
// =============================================================================

impl ApiClient {
    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<DailyReport>, ApiError> {
        self.get_json(REPORTS_PATH, &query.to_params()).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn get_report(&self, id: i64) -> Result<DailyReport, ApiError> {
        self.get_json(&item_path(REPORTS_PATH, id), &[]).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn create_report(&self, report: &DailyReportCreate) -> Result<DailyReport, ApiError> {
        self.post_json(REPORTS_PATH, report).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn update_report(&self, id: i64, update: &DailyReportUpdate) -> Result<DailyReport, ApiError> {
        self.put_json(&item_path(REPORTS_PATH, id), update).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn delete_report(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&item_path(REPORTS_PATH, id)).await
    }
}

// =============================================================================
// USERS
// =============================================================================

impl ApiClient {
    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn list_users(&self, page: Pagination) -> Result<Vec<UserProfile>, ApiError> {
        self.get_json(USERS_PATH, &page.to_params()).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn get_user(&self, id: i64) -> Result<UserProfile, ApiError> {
        self.get_json(&item_path(USERS_PATH, id), &[]).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn create_user(&self, user: &UserCreate) -> Result<UserProfile, ApiError> {
        self.post_json(USERS_PATH, user).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<UserProfile, ApiError> {
        self.put_json(&item_path(USERS_PATH, id), update).await
    }

    /// # Errors
    ///
    /// Propagates gateway errors.
    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&item_path(USERS_PATH, id)).await
    }
}
