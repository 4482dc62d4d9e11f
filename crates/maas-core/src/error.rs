//! Error types for MAAS operations.
//!
//! This module provides the error taxonomy shared by every MAAS client crate,
//! the raw [`ServerError`] produced by the transport, and [`StatusPolicy`], the
//! declarative table used to translate HTTP status codes into semantic errors
//! on a per-operation basis.

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Main error type for MAAS operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// No resource satisfies the requested constraints
    #[error("{0}")]
    NoMatch(String),

    /// Caller lacks the rights for the operation
    #[error("{0}")]
    PermissionDenied(String),

    /// Server rejected the request as malformed
    #[error("{0}")]
    BadRequest(String),

    /// Local argument validation failed before any request was made
    #[error("{0} not valid")]
    NotValid(String),

    /// Server could not complete the operation (e.g. resource exhaustion)
    #[error("{0}")]
    CannotComplete(String),

    /// Unmapped server status or internal consistency failure
    #[error("unexpected: {0}")]
    Unexpected(String),

    /// Payload did not match the expected schema
    #[error("decode error: {0}")]
    Decode(String),

    /// Untranslated non-2xx response from the transport
    #[error("{0}")]
    Server(ServerError),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for MAAS: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for MAAS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Closed set of semantic error kinds callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Resource absent
    NotFound,
    /// Nothing satisfies the given constraints
    NoMatch,
    /// Caller lacks rights
    PermissionDenied,
    /// Malformed input, detected locally or by the server
    BadRequest,
    /// Transient resource exhaustion on the server
    CannotComplete,
    /// Anything not explicitly mapped
    Unexpected,
    /// Client/server contract mismatch in a payload
    Decode,
    /// Client construction or configuration problem
    Config,
}

/// Non-2xx response returned by a transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ServerError: {status} ({body})")]
pub struct ServerError {
    /// HTTP status code of the response
    pub status: StatusCode,
    /// Response body as text
    pub body: String,
}

impl ServerError {
    /// Create a server error from a status and body.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Semantic error kind
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl Error {
    /// Build an error of the given kind carrying `message` verbatim.
    #[must_use]
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::NoMatch => Self::NoMatch(message),
            ErrorKind::PermissionDenied => Self::PermissionDenied(message),
            ErrorKind::BadRequest => Self::BadRequest(message),
            ErrorKind::CannotComplete => Self::CannotComplete(message),
            ErrorKind::Unexpected => Self::Unexpected(message),
            ErrorKind::Decode => Self::Decode(message),
            ErrorKind::Config => Self::ConfigError(message),
        }
    }

    /// Returns the semantic kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NoMatch(_) => ErrorKind::NoMatch,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::BadRequest(_) | Self::NotValid(_) => ErrorKind::BadRequest,
            Self::CannotComplete(_) => ErrorKind::CannotComplete,
            Self::Unexpected(_) | Self::Server(_) | Self::HttpError(_) | Self::Timeout(_) => {
                ErrorKind::Unexpected
            }
            Self::Decode(_) => ErrorKind::Decode,
            Self::ConfigError(_) | Self::InvalidEndpoint(_) => ErrorKind::Config,
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::NoMatch(_) => "NO_MATCH",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotValid(_) => "NOT_VALID",
            Self::CannotComplete(_) => "CANNOT_COMPLETE",
            Self::Unexpected(_) => "UNEXPECTED",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Server(_) => "SERVER_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Unexpected | ErrorKind::Decode | ErrorKind::Config
        )
    }
}

/// Per-operation mapping of HTTP status codes onto error kinds.
///
/// The same status means different things depending on the endpoint that
/// raised it, so every operation carries its own table. `403 Forbidden` is
/// `PermissionDenied` unless a table says otherwise; any status not listed
/// becomes `Unexpected` with the server error text preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    name: &'static str,
    rules: &'static [(StatusCode, ErrorKind)],
}

impl StatusPolicy {
    /// Create a policy for the named operation.
    #[must_use]
    pub const fn new(name: &'static str, rules: &'static [(StatusCode, ErrorKind)]) -> Self {
        Self { name, rules }
    }

    /// Operation name, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Look up the kind for a status, if mapped.
    #[must_use]
    pub fn kind_for(&self, status: StatusCode) -> Option<ErrorKind> {
        self.rules
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, kind)| *kind)
            .or_else(|| (status == StatusCode::FORBIDDEN).then_some(ErrorKind::PermissionDenied))
    }

    /// Translate a transport error into the operation's error taxonomy.
    ///
    /// Only server responses and raw transport failures are reclassified;
    /// errors that already carry a kind pass through unchanged.
    #[must_use]
    pub fn translate(&self, err: Error) -> Error {
        match err {
            Error::Server(server) => match self.kind_for(server.status) {
                Some(kind) => Error::from_kind(kind, server.body),
                None => Error::Unexpected(server.to_string()),
            },
            err @ (Error::HttpError(_) | Error::Timeout(_)) => Error::Unexpected(err.to_string()),
            other => other,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<ServerError> for Error {
    fn from(err: ServerError) -> Self {
        Self::Server(err)
    }
}
