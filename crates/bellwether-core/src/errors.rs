use serde::{Deserialize, Serialize};

/// Failure classes a backend call can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    Auth,
    Timeout,
    RateLimited,
    Transport,
    MalformedResponse,
}

impl BackendErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendErrorKind::Auth => "auth",
            BackendErrorKind::Timeout => "timeout",
            BackendErrorKind::RateLimited => "rate_limited",
            BackendErrorKind::Transport => "transport",
            BackendErrorKind::MalformedResponse => "malformed_response",
        }
    }
}

/// Error returned by a backend client call.
///
/// Caught at single-scenario granularity by the harness; never escalated to
/// abort sibling scenarios or other backends.
#[derive(Debug, Clone, thiserror::Error)]
#[error("backend error ({}): {message}", .kind.as_str())]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Transport, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::MalformedResponse, message)
    }

    /// Map an HTTP status to the failure class it signals.
    pub fn from_status(status: u16, body: String) -> Self {
        let kind = match status {
            401 | 403 => BackendErrorKind::Auth,
            429 => BackendErrorKind::RateLimited,
            _ => BackendErrorKind::Transport,
        };
        Self::new(kind, format!("HTTP {}: {}", status, body))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::new(BackendErrorKind::Timeout, e.to_string())
        } else if e.is_decode() {
            BackendError::malformed(e.to_string())
        } else {
            BackendError::transport(e.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);
