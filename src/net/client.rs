//! HTTP gateway: every backend call goes through `ApiClient`.
//!
//! SYSTEM CONTEXT
//! ==============
//! Before each call the current bearer token is read from a `TokenSource`
//! (the session store in production). A 401 on an authenticated call is
//! published to the registered `UnauthorizedHandler`s, which own the
//! session teardown; this module never writes session state itself.
//!
//! ERROR HANDLING
//! ==============
//! No call is retried here. 403 is logged and returned as-is; network
//! failures, 5xx, and other 4xx pass straight through to the caller.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

pub use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{ApiError, classify_status};
use super::types::error_detail;
use crate::config::ClientConfig;

// =============================================================================
// SEAMS
// =============================================================================

/// Supplies the bearer token attached to outgoing requests.
pub trait TokenSource: Send + Sync {
    /// `None` is a valid unauthenticated state, not an error.
    fn bearer_token(&self) -> Option<String>;
}

/// Subscriber notified once per call that comes back 401.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

impl<F> UnauthorizedHandler for F
where
    F: Fn() + Send + Sync,
{
    fn on_unauthorized(&self) {
        self();
    }
}

/// Whether a 401 on this call means "the stored session is dead".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPolicy {
    Authenticated,
    /// Calls made before a session exists (login). A 401 here is a plain rejection.
    Anonymous,
}

// =============================================================================
// RESPONSE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
    unauthorized: Arc<RwLock<Vec<Arc<dyn UnauthorizedHandler>>>>,
}

impl ApiClient {
    /// Build a client for `config.api_base_url` with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenSource>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            tokens,
            unauthorized: Arc::new(RwLock::new(Vec::new())),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Subscribe to 401s on authenticated calls.
    pub fn on_unauthorized(&self, handler: Arc<dyn UnauthorizedHandler>) {
        self.unauthorized
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Send an authenticated request and return the raw 2xx response.
    ///
    /// # Errors
    ///
    /// Returns `SessionExpired` on 401 (after notifying subscribers),
    /// `Forbidden` on 403, and the matching pass-through variant otherwise.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        params: &[(&str, String)],
    ) -> Result<ApiResponse, ApiError> {
        self.send(method, path, body, params, SessionPolicy::Authenticated)
            .await
    }

    /// Like [`ApiClient::request`], with an explicit 401 policy.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`]; with `SessionPolicy::Anonymous` a 401 is
    /// returned as `Rejected` and nobody is notified.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        params: &[(&str, String)],
        policy: SessionPolicy,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(path)?;
        let mut builder = self.http.request(method.clone(), &url);
        if let Some(token) = self.tokens.bearer_token() {
            builder = builder.bearer_auth(token);
        }
        if !params.is_empty() {
            builder = builder.query(params);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if (200..300).contains(&status) {
            tracing::debug!(%method, path, status, "request ok");
            return Ok(ApiResponse { status, body: text });
        }

        let detail = error_detail(&text);
        match (status, policy) {
            (401, SessionPolicy::Authenticated) => {
                tracing::warn!(%method, path, "received 401; invalidating session");
                self.notify_unauthorized();
                Err(ApiError::SessionExpired)
            }
            (403, _) => {
                tracing::warn!(%method, path, %detail, "insufficient permission");
                Err(classify_status(status, detail))
            }
            _ => {
                tracing::debug!(%method, path, status, %detail, "request failed");
                Err(classify_status(status, detail))
            }
        }
    }

    /// # Errors
    ///
    /// Propagates request errors; `Parse` if the body does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T, ApiError> {
        self.request(Method::GET, path, None, params).await?.json()
    }

    /// # Errors
    ///
    /// Propagates request errors; `Parse` if the body does not match `T`.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_body(body)?;
        self.request(Method::POST, path, Some(&body), &[]).await?.json()
    }

    /// # Errors
    ///
    /// Propagates request errors; `Parse` if the body does not match `T`.
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_body(body)?;
        self.request(Method::PUT, path, Some(&body), &[]).await?.json()
    }

    /// DELETE, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, path, None, &[]).await?;
        Ok(())
    }

    fn url_for(&self, path: &str) -> Result<String, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::InvalidRequest(format!("path must start with '/': {path}")));
        }
        Ok(format!("{}{path}", self.base_url))
    }

    fn notify_unauthorized(&self) {
        let handlers = self
            .unauthorized
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            handler.on_unauthorized();
        }
    }
}

pub(crate) fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}
