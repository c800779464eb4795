//! Error types for the RTIR REST client.
//!
//! This module defines `RtirError`, the unified error type returned by every
//! client operation. Callers that want the best-effort behavior of the
//! classic client (empty values instead of errors) can use
//! [`OrEmpty`](crate::compat::OrEmpty).
//!
//! # Security
//!
//! Error messages built from server responses may echo submitted form data.
//! Use `sanitize_message()` with the session password before logging or
//! returning them to users.

use std::time::Duration;
use thiserror::Error;

/// Status codes found on the first line of RT REST responses.
pub mod codes {
    /// Request accepted.
    pub const OK: u16 = 200;
    /// Malformed request or payload.
    pub const BAD_REQUEST: u16 = 400;
    /// Session cookie or credentials missing.
    pub const CREDENTIALS_REQUIRED: u16 = 401;
    /// Object does not exist.
    pub const NOT_FOUND: u16 = 404;
    /// Syntax error in the submitted form.
    pub const SYNTAX_ERROR: u16 = 409;
}

/// Unified error type for all RTIR client operations.
#[derive(Error, Debug)]
pub enum RtirError {
    /// Configuration error - missing or invalid settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// HTTP response returned a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The response body, truncated and sanitized.
        body: String,
    },

    /// Request timed out.
    #[error("request timed out after {duration:?} - the server may be slow or unreachable")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The operation that timed out.
        operation: String,
    },

    /// The server rejected the credentials at HTTP level.
    #[error("authentication failed - check RTIR_USER and RTIR_PASSWORD")]
    Authentication,

    /// The operation needs a session and none is established.
    #[error("not logged in")]
    NotLoggedIn,

    /// No credentials are available (for example after logout).
    #[error("no credentials available - use new_login to provide them")]
    MissingCredentials,

    /// RT answered with a non-200 status line.
    #[error("RT error {code}: {message}")]
    RtApi {
        /// Status code from the `RT/x.y.z <code> <message>` line.
        code: u16,
        /// Status message from the same line.
        message: String,
    },

    /// Requested object does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Object kind ("ticket", "queue", ...).
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// The ticket field is not part of the known field list.
    #[error("unknown ticket field: {0}")]
    UnknownField(String),

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// JSON serialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RtirError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        RtirError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        RtirError::Config(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        RtirError::Validation(message.into())
    }

    /// Creates a not found error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        RtirError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        RtirError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Creates an error for an RT status line other than 200.
    pub fn rt_api(code: u16, message: impl Into<String>) -> Self {
        RtirError::RtApi {
            code,
            message: message.into(),
        }
    }

    /// Creates an unexpected response error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        RtirError::UnexpectedResponse(message.into())
    }

    /// Returns true if the error means the session is gone and a new login
    /// is required.
    #[must_use]
    pub fn is_session_error(&self) -> bool {
        match self {
            RtirError::NotLoggedIn | RtirError::Authentication => true,
            RtirError::RtApi { code, .. } => *code == codes::CREDENTIALS_REQUIRED,
            _ => false,
        }
    }

    /// Sanitizes a message by replacing every occurrence of the secret with
    /// `[REDACTED]`.
    #[must_use]
    pub fn sanitize_message(message: &str, secret: &str) -> String {
        if secret.is_empty() {
            return message.to_string();
        }
        message.replace(secret, "[REDACTED]")
    }

    /// Creates a sanitized version of this error's display message.
    #[must_use]
    pub fn sanitized_display(&self, secret: &str) -> String {
        Self::sanitize_message(&self.to_string(), secret)
    }
}
