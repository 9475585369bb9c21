//! Error types for GraphQL operations.
//!
//! Errors are categorized so callers can tell a flaky network from a bad API
//! key or a server that answered with something unexpected.

use std::fmt;

/// Result type alias for GraphQL operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of GraphQL errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Server unreachable or answering 5xx (transient).
    Network,
    /// API key rejected.
    Auth,
    /// The server answered, but not with usable data.
    Protocol,
    /// Anything else.
    Other,
}

impl ErrorCategory {
    /// Whether the next poll may succeed without operator action.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Short human-readable label.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Server unreachable",
            Self::Auth => "Authentication failed",
            Self::Protocol => "Unexpected server response",
            Self::Other => "Unexpected error",
        }
    }

    /// What the operator should check.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check that the server is reachable and the endpoint is correct",
            Self::Auth => "Check the API key and its permissions",
            Self::Protocol => "The server may run an incompatible API version",
            Self::Other => "Run with -vv and check the log for details",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to a GraphQL endpoint.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// Status code, when the server answered at all.
        status: Option<u16>,
    },

    /// The server rejected the API key.
    #[error("unauthorized (HTTP {status})")]
    Unauthorized {
        /// HTTP status code (401 or 403).
        status: u16,
    },

    /// The response carried errors and no data.
    #[error("GraphQL error: {}", messages.join("; "))]
    GraphQl {
        /// Messages of every reported error.
        messages: Vec<String>,
    },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The response had neither data nor errors.
    #[error("response contained no data")]
    MissingData,

    /// Anything not covered above.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::HttpError`].
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Classify the error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError { status, .. } => match status {
                Some(code) if *code < 500 => ErrorCategory::Protocol,
                _ => ErrorCategory::Network,
            },
            Self::Unauthorized { .. } => ErrorCategory::Auth,
            Self::GraphQl { .. } | Self::InvalidResponse(_) | Self::MissingData => {
                ErrorCategory::Protocol
            }
            Self::Other(_) => ErrorCategory::Other,
        }
    }

    /// Shorthand for `self.category().is_retryable()`.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status @ (401 | 403)) => Self::Unauthorized { status },
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
