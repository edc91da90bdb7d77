//! Error taxonomy for calls made through the HTTP gateway.
//!
//! ERROR HANDLING
//! ==============
//! Only a 401 on an authenticated call is recovered by the client itself
//! (session invalidation + restart). Everything else is handed back to the
//! caller unchanged so it can decide how to present the failure.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Errors produced by backend calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The login endpoint rejected the submitted email/password.
    #[error("invalid credentials: {detail}")]
    InvalidCredentials { status: u16, detail: String },

    /// An authenticated call returned 401; the local session has been torn down.
    #[error("session expired or invalid")]
    SessionExpired,

    /// The server refused the call for the current role.
    #[error("insufficient permission: {detail}")]
    Forbidden { detail: String },

    /// Any other 4xx, including validation failures.
    #[error("request rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// 5xx from the backend.
    #[error("server error {status}: {detail}")]
    Server { status: u16, detail: String },

    /// Connection failure or timeout.
    #[error("request failed: {0}")]
    Network(String),

    /// The response body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The request could not be built (bad path, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Coarse classes the rest of the client reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    InvalidCredentials,
    ExpiredOrInvalidSession,
    InsufficientPermission,
    NetworkOrServerFailure,
    /// Problems on our side before anything reached the network.
    Client,
}

impl ApiError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidCredentials { .. } => ErrorClass::InvalidCredentials,
            Self::SessionExpired => ErrorClass::ExpiredOrInvalidSession,
            Self::Forbidden { .. } => ErrorClass::InsufficientPermission,
            Self::Rejected { .. } | Self::Server { .. } | Self::Network(_) | Self::Parse(_) => {
                ErrorClass::NetworkOrServerFailure
            }
            Self::InvalidRequest(_) | Self::HttpClientBuild(_) => ErrorClass::Client,
        }
    }

    /// HTTP status behind the error, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidCredentials { status, .. } | Self::Rejected { status, .. } | Self::Server { status, .. } => {
                Some(*status)
            }
            Self::SessionExpired => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::Network(_) | Self::Parse(_) | Self::InvalidRequest(_) | Self::HttpClientBuild(_) => None,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials { .. } => "E_INVALID_CREDENTIALS",
            Self::SessionExpired => "E_SESSION_EXPIRED",
            Self::Forbidden { .. } => "E_FORBIDDEN",
            Self::Rejected { .. } => "E_REJECTED",
            Self::Server { .. } => "E_SERVER",
            Self::Network(_) => "E_NETWORK",
            Self::Parse(_) => "E_PARSE",
            Self::InvalidRequest(_) => "E_INVALID_REQUEST",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Re-label a 4xx from the login endpoint as a credential rejection.
    #[must_use]
    pub fn into_login_error(self) -> Self {
        match self {
            Self::Rejected { status, detail } => Self::InvalidCredentials { status, detail },
            Self::Forbidden { detail } => Self::InvalidCredentials { status: 403, detail },
            other => other,
        }
    }
}

/// Map a non-2xx status to an error. 401 handling depends on whether the
/// call carried a session, so it is decided by the caller.
pub(crate) fn classify_status(status: u16, detail: String) -> ApiError {
    match status {
        403 => ApiError::Forbidden { detail },
        500..=599 => ApiError::Server { status, detail },
        _ => ApiError::Rejected { status, detail },
    }
}
