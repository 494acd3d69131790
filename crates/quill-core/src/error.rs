//! Unified error types for Quill

use std::fmt;
use thiserror::Error;

/// Provider-agnostic classification of a failed model or embedding call.
///
/// The first four kinds are transient and eligible for retry with backoff;
/// the rest propagate to the caller immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationFailure {
    /// Provider throttled the request (HTTP 429)
    RateLimited,
    /// Provider or network path temporarily unavailable
    Unavailable,
    /// Provider-side internal error (5xx)
    Internal,
    /// Attempt exceeded its time bound
    Timeout,
    /// Credential rejected by the provider
    Authentication,
    /// Request rejected as malformed
    InvalidRequest,
    /// Provider answered, but not in a shape we can read
    MalformedResponse,
}

impl InvocationFailure {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Unavailable | Self::Internal | Self::Timeout
        )
    }

    /// Classify an HTTP status code returned by a provider
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            502..=504 => Self::Unavailable,
            500..=599 => Self::Internal,
            401 | 403 => Self::Authentication,
            _ => Self::InvalidRequest,
        }
    }
}

impl fmt::Display for InvocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RateLimited => "rate limited",
            Self::Unavailable => "service unavailable",
            Self::Internal => "internal server error",
            Self::Timeout => "timed out",
            Self::Authentication => "authentication failed",
            Self::InvalidRequest => "invalid request",
            Self::MalformedResponse => "malformed response",
        };
        f.write_str(label)
    }
}

/// Unified error type for all Quill operations
#[derive(Error, Debug)]
pub enum QuillError {
    // Model errors
    #[error("Model invocation failed ({kind}): {message}")]
    ModelInvocation {
        kind: InvocationFailure,
        message: String,
    },

    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    // Registry errors
    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    // Storage errors
    #[error("Consistency store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl QuillError {
    /// Shorthand for a classified model invocation failure
    pub fn invocation(kind: InvocationFailure, message: impl Into<String>) -> Self {
        Self::ModelInvocation {
            kind,
            message: message.into(),
        }
    }

    /// Whether a retry with backoff may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ModelInvocation { kind, .. } => kind.is_transient(),
            _ => false,
        }
    }

    /// Whether the failure is about a missing or rejected credential
    pub fn is_credential_related(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential(_)
                | Self::ModelInvocation {
                    kind: InvocationFailure::Authentication,
                    ..
                }
        )
    }
}

/// Result type alias using QuillError
pub type Result<T> = std::result::Result<T, QuillError>;
