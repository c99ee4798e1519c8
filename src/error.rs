//! Error types for topic synchronization.
//!
//! Every failure the remote layer can raise is a [`TopicError`]. The store records its
//! message as a flat string in `last_error`, and hands the typed value back to the caller
//! so it can branch on [`TopicError::kind`] (e.g. redirect to login on [`ErrorKind::Auth`]).

use std::fmt;

use thiserror::Error;

/// Errors that can occur while talking to the topic backend.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TopicError {
    /// Input rejected, either locally before sending or by the backend.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Session credential missing, expired or rejected.
    #[error("authentication required: {0}")]
    Auth(String),

    /// The targeted topic is unknown to the backend.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a status outside the classified ones.
    #[error("backend error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// Response payload could not be decoded into a topic record.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// Client configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The action stopped before it settled (runtime shut down or the task panicked).
    /// Whether the backend applied it is unknown.
    #[error("action aborted: {0}")]
    Aborted(String),
}

/// Coarse classification of a [`TopicError`] for callers that want to branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`TopicError::Validation`].
    Validation,
    /// See [`TopicError::Auth`].
    Auth,
    /// See [`TopicError::NotFound`].
    NotFound,
    /// See [`TopicError::Network`].
    Network,
    /// See [`TopicError::Server`].
    Server,
    /// See [`TopicError::Protocol`].
    Protocol,
    /// See [`TopicError::Config`].
    Config,
    /// See [`TopicError::Aborted`].
    Aborted,
}

impl ErrorKind {
    /// Stable string representation (for logs).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::NotFound => "not_found",
            Self::Network => "network",
            Self::Server => "server",
            Self::Protocol => "protocol",
            Self::Config => "config",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TopicError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Auth(_) => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Network(_) => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Config(_) => ErrorKind::Config,
            Self::Aborted(_) => ErrorKind::Aborted,
        }
    }

    /// Whether re-invoking the same action may succeed.
    ///
    /// Nothing in this crate retries; this is a hint for the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Map a non-success HTTP status and its extracted message to an error.
    #[must_use]
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        match status {
            400 | 409 | 422 => {
                Self::Validation(message.unwrap_or_else(|| "request rejected".to_string()))
            }
            401 | 403 => Self::Auth(message.unwrap_or_else(|| "session rejected".to_string())),
            404 => Self::NotFound(message.unwrap_or_else(|| "resource not found".to_string())),
            _ => Self::Server {
                status,
                message: message.unwrap_or_else(|| "unexpected response".to_string()),
            },
        }
    }
}

impl From<reqwest::Error> for TopicError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::Protocol(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TopicError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<tokio::task::JoinError> for TopicError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            Self::Aborted("action task panicked".to_string())
        } else {
            Self::Aborted("action task cancelled".to_string())
        }
    }
}

impl From<url::ParseError> for TopicError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid url: {err}"))
    }
}

/// Convenience result alias for topic operations.
pub type TopicResult<T> = Result<T, TopicError>;
