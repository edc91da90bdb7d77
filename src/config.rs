//! Client configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! The binary loads `.env` first, then reads the process environment here.
//! `from_vars` takes an arbitrary lookup so tests never touch the real
//! environment.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

const SESSION_DIR_NAME: &str = ".salesdesk";
const SESSION_FILE_NAME: &str = "session.json";
const FALLBACK_SESSION_FILE: &str = ".salesdesk-session.json";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API base URL {0:?}: expected http:// or https://")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, without a trailing slash.
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Where the persisted credential lives between runs.
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `SALESDESK_API_BASE_URL`: default `http://localhost:8000`
    /// - `SALESDESK_REQUEST_TIMEOUT_SECS`: default 10
    /// - `SALESDESK_CONNECT_TIMEOUT_SECS`: default 5
    /// - `SALESDESK_SESSION_FILE`: default `$HOME/.salesdesk/session.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build config from any variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an http(s) URL.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = normalize_base_url(
            lookup("SALESDESK_API_BASE_URL")
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        )?;
        let request_timeout_secs = parse_or(
            lookup("SALESDESK_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        );
        let connect_timeout_secs = parse_or(
            lookup("SALESDESK_CONNECT_TIMEOUT_SECS"),
            DEFAULT_CONNECT_TIMEOUT_SECS,
        );
        let session_file = lookup("SALESDESK_SESSION_FILE")
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(|| default_session_file(lookup("HOME")), PathBuf::from);

        Ok(Self { api_base_url, request_timeout_secs, connect_timeout_secs, session_file })
    }

    /// Replace the base URL, applying the same validation as `from_vars`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not an http(s) URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_base_url = normalize_base_url(raw)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn parse_or(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn default_session_file(home: Option<String>) -> PathBuf {
    match home.filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home).join(SESSION_DIR_NAME).join(SESSION_FILE_NAME),
        None => PathBuf::from(FALLBACK_SESSION_FILE),
    }
}
