//! Error types for route registration and configuration.
//!
//! Dispatch itself has no error path: an unmatched request is answered by the
//! not-found handler and a non-canonical path by a redirect.

use thiserror::Error;

/// Multiplexer errors.
#[derive(Debug, Error)]
pub enum MuxError {
    /// A route was registered with an empty pattern.
    #[error("route pattern must not be empty")]
    EmptyPattern,

    /// The same parameter name appears twice in one pattern.
    #[error("duplicate parameter `{name}` in pattern {pattern}")]
    DuplicateParam { pattern: String, name: String },

    /// `pop` was called with no middleware pushed.
    #[error("middleware stack is empty")]
    EmptyMiddlewareStack,

    /// A method name that is not a valid HTTP token.
    #[error("invalid HTTP method token: {0:?}")]
    InvalidMethod(String),

    /// Router configuration could not be parsed.
    #[error("invalid router configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for multiplexer operations.
pub type Result<T> = std::result::Result<T, MuxError>;
