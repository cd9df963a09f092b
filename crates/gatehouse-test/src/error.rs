//! Test error types.

use std::fmt;

/// Errors that can occur while building or reading test traffic.
#[derive(Debug)]
pub enum TestError {
    /// Request building failed
    RequestBuild(String),
    /// JSON serialization/deserialization failed
    Json(serde_json::Error),
    /// Header name or value is invalid
    InvalidHeader(String),
    /// Response did not have the expected shape
    UnexpectedResponse(String),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestBuild(msg) => write!(f, "Request build error: {msg}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::InvalidHeader(msg) => write!(f, "Invalid header: {msg}"),
            Self::UnexpectedResponse(msg) => write!(f, "Unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for TestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TestError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
