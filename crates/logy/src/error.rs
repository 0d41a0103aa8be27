//! Error types for request handling and logging
//!
//! Handlers report their outcome through [`HandlerResult`]. A normal response
//! is `Ok`, everything else is an [`Abort`]:
//!
//! - [`Abort::Error`] carries an [`ApiError`], the typed equivalent of an
//!   exception raised by the handler. It may declare its own HTTP status.
//! - [`Abort::Failure`] carries a [`Failure`], the framework's signal for
//!   expected failures such as parameter validation.
//!
//! # Example
//! ```rust,ignore
//! use logy::{ApiError, Failure, HandlerResult};
//!
//! fn find(id: u64) -> HandlerResult {
//!     Err(ApiError::new("Widgets::NotFound", format!("widget {id} not found")).into())
//! }
//!
//! fn validate() -> HandlerResult {
//!     Err(Failure::new(400).with_message("id is missing").into())
//! }
//! ```

use crate::request::Response;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result of invoking a handler through the middleware chain.
pub type HandlerResult = Result<Response, Abort>;

/// Error kind used for handler panics.
pub const PANIC_KIND: &str = "panic";

/// Error raised by a handler.
///
/// `kind` identifies the error type and is the key used by the
/// [`StatusExceptionRegistry`](crate::StatusExceptionRegistry) when the
/// error does not declare a status itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    /// Error type identifier
    pub kind: String,
    /// Human-readable message
    pub message: String,
    /// HTTP status declared by the error itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ApiError {
    /// Create an error of the given kind without a declared status.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Build an error from any Rust error, using its type name as the kind.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::new(std::any::type_name::<E>(), error.to_string())
    }

    /// Declare the HTTP status for this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BadRequest", message).with_status(400)
    }

    /// 401 Unauthorized.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("Unauthorized", message).with_status(401)
    }

    /// 403 Forbidden.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("Forbidden", message).with_status(403)
    }

    /// 404 Not Found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NotFound", message).with_status(404)
    }

    /// 409 Conflict.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("Conflict", message).with_status(409)
    }

    /// 422 Unprocessable Entity.
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new("UnprocessableEntity", message).with_status(422)
    }

    /// 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("InternalError", message).with_status(500)
    }

    /// Error describing a handler panic.
    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(PANIC_KIND, message).with_status(500)
    }

    /// Returns true if the status is declared and in the 4xx range.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status, Some(400..=499))
    }

    /// Returns true if the status is declared and in the 5xx range.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(500..=599))
    }
}

/// Failure signalled by the framework without unwinding the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// HTTP status of the failure
    pub status: u16,
    /// Optional message describing the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Failure {
    /// Create a failure with a status and no message.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            message: None,
        }
    }

    /// Attach a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "[{}] {}", self.status, message),
            None => write!(f, "[{}]", self.status),
        }
    }
}

impl std::error::Error for Failure {}

/// Non-success outcome of a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Abort {
    /// The handler raised an error
    #[error(transparent)]
    Error(#[from] ApiError),
    /// The framework signalled a failure
    #[error(transparent)]
    Failure(#[from] Failure),
}

impl Abort {
    /// Returns the error if this is a raised handler error.
    pub fn as_error(&self) -> Option<&ApiError> {
        match self {
            Self::Error(error) => Some(error),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure if this is a framework failure.
    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Error(_) => None,
        }
    }
}

/// Error returned by a [`LogSink`](crate::logging::LogSink) that could not write a line.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    /// Writing to the underlying stream failed
    #[error("failed to write log line: {0}")]
    Io(#[from] std::io::Error),
    /// The sink's shared buffer is unusable
    #[error("log sink unavailable: {0}")]
    Unavailable(String),
}

/// Configuration validation failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A configured header name is empty or whitespace
    #[error("header names must not be blank")]
    BlankHeaderName,
    /// The `headers` setting is neither `"all"` nor a list of names
    #[error("unknown headers setting {0:?}, expected \"all\" or a list of names")]
    UnknownHeaderSetting(String),
    /// A registered status is not a valid HTTP status
    #[error("status {status} registered for {kind} is not a valid HTTP status")]
    InvalidStatus {
        /// Error kind the status was registered for
        kind: String,
        /// The rejected status
        status: u16,
    },
    /// The slow query threshold must be positive
    #[error("slow query threshold must be positive, got {0}")]
    InvalidSlowQueryThreshold(f64),
}

/// Crate-level error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LogyError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Subscription pattern failed to compile
    #[error("invalid event pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    /// Settings could not be parsed
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Result alias for fallible crate operations.
pub type LogyResult<T> = Result<T, LogyError>;
