//! Error types for user operations.

use thiserror::Error;

/// Classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    /// The requested user does not exist upstream.
    NotFound,
    /// Any other upstream or transport failure.
    Internal,
}

impl ServiceErrorKind {
    /// The HTTP-style status code for this kind.
    pub fn code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }
}

/// The only error [`crate::UserService`] returns.
///
/// Upstream failures are classified once and re-wrapped into this shape; the original
/// upstream error never crosses the service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    kind: ServiceErrorKind,
    message: String,
}

impl ServiceError {
    /// Creates a `NotFound` error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ServiceErrorKind::NotFound,
            message: message.into(),
        }
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ServiceErrorKind::Internal,
            message: message.into(),
        }
    }

    /// The classification of this error.
    pub fn kind(&self) -> ServiceErrorKind {
        self.kind
    }

    /// Status code meant to be used verbatim as the HTTP status.
    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A failure talking to the upstream user provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upstream request failed{}: {message}", status_suffix(.status))]
pub struct UpstreamError {
    /// HTTP status of the upstream response, when one was received.
    pub status: Option<u16>,
    /// Detailed error information.
    pub message: String,
}

impl UpstreamError {
    /// An error carrying an upstream response status.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// An error where no response status was received (connect, timeout, decode).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// True when the upstream answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!(" (HTTP {})", status),
        None => String::new(),
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}
