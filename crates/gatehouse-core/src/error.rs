//! Error types for Gatehouse.
//!
//! [`RouteError`] is what middleware, handlers, and the validation stage
//! return when an invocation cannot produce its normal response. Each variant
//! maps to one [`ErrorKind`], which fixes the HTTP status and the `error`
//! string clients see:
//!
//! | Variant | Kind | Status |
//! |---|---|---|
//! | `RequestValidation` | `RequestValidationError` | 422 |
//! | `ResponseValidation` | `ResponseValidationError` | 500 |
//! | `NotFound` | `NotFoundError` | 404 |
//! | `RouteNotMatched` | `NotFoundError` | 404 |
//! | `Internal` | `InternalError` | 500 |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::issue::ValidationError;

/// Result type alias using [`RouteError`].
pub type RouteResult<T> = Result<T, RouteError>;

/// Client-facing error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The request violated a declared schema.
    RequestValidationError,
    /// The handler produced a body violating its declared schema.
    ResponseValidationError,
    /// A resource or route does not exist.
    NotFoundError,
    /// Anything else.
    InternalError,
}

impl ErrorKind {
    /// Returns the name used in error bodies.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequestValidationError => "RequestValidationError",
            Self::ResponseValidationError => "ResponseValidationError",
            Self::NotFoundError => "NotFoundError",
            Self::InternalError => "InternalError",
        }
    }

    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::RequestValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFoundError => StatusCode::NOT_FOUND,
            Self::ResponseValidationError | Self::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard error type for routes.
///
/// # Example
///
/// ```
/// use gatehouse_core::{ErrorKind, RouteError};
/// use http::StatusCode;
///
/// let err = RouteError::not_found("Product not found");
/// assert_eq!(err.kind(), ErrorKind::NotFoundError);
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// ```
#[derive(Error, Debug)]
pub enum RouteError {
    /// The request failed validation.
    #[error("Request validation failed: {0}")]
    RequestValidation(ValidationError),

    /// The handler's response failed validation.
    #[error("Response validation failed: {0}")]
    ResponseValidation(ValidationError),

    /// Explicit not-found signal from a handler.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// No registered route matches the method and path.
    #[error("No route for {method} {path}")]
    RouteNotMatched {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl RouteError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a route-miss error.
    #[must_use]
    pub fn route_not_matched(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::RouteNotMatched {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the client-facing kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RequestValidation(_) => ErrorKind::RequestValidationError,
            Self::ResponseValidation(_) => ErrorKind::ResponseValidationError,
            Self::NotFound { .. } | Self::RouteNotMatched { .. } => ErrorKind::NotFoundError,
            Self::Internal { .. } => ErrorKind::InternalError,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Returns the validation issues, if this is a validation error.
    #[must_use]
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            Self::RequestValidation(err) | Self::ResponseValidation(err) => Some(err),
            _ => None,
        }
    }

    /// Converts this error to a serializable envelope.
    ///
    /// Request-validation issues and not-found messages are always
    /// included. Response-validation issues and internal messages are
    /// server-side detail and only included when `expose_internal` is set.
    #[must_use]
    pub fn to_envelope(&self, expose_internal: bool) -> ErrorEnvelope {
        let details = match self {
            Self::RequestValidation(err) => Some(serde_json::json!({ "issues": err.issues() })),
            Self::ResponseValidation(err) if expose_internal => {
                Some(serde_json::json!({ "issues": err.issues() }))
            }
            Self::NotFound { message } => Some(serde_json::json!({ "message": message })),
            Self::Internal { message, source } if expose_internal => {
                let mut details = serde_json::json!({ "message": message });
                if let Some(source) = source {
                    details["source"] = Value::String(format!("{source:#}"));
                }
                Some(details)
            }
            _ => None,
        };

        ErrorEnvelope {
            error: self.kind().as_str().to_string(),
            details,
        }
    }
}

impl From<anyhow::Error> for RouteError {
    fn from(source: anyhow::Error) -> Self {
        Self::Internal {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Serializable error body: `{ "error": ..., "details": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error kind name.
    pub error: String,
    /// Kind-specific detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
