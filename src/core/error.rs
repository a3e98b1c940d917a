//! # Error Handling Module
//!
//! This module provides error handling for the balancer using the `thiserror` crate.
//!
//! Per-session failures (a client hanging up, a backend dying mid-exchange, the
//! pool running dry) are deliberately *not* errors — they are reported as
//! [`crate::session::SessionOutcome`] values and handled locally. Only failures
//! that prevent the balancer from running at all surface through this type.

use thiserror::Error;

/// Main result type used throughout the balancer
///
/// This is a type alias that makes error handling more ergonomic.
/// Instead of writing `Result<T, BalancerError>` everywhere, we can use `BalancerResult<T>`.
pub type BalancerResult<T> = Result<T, BalancerError>;

/// Error types for the TCP balancer
///
/// Each variant represents a different category of error that can occur.
/// The `#[error("...")]` attribute from `thiserror` automatically implements
/// the `Display` trait with the specified error message.
#[derive(Debug, Error)]
pub enum BalancerError {
    /// Configuration-related errors (invalid config, missing files, etc.)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Startup connection to a configured backend failed
    #[error("Backend connect failed: {backend} - {message}")]
    BackendConnect { backend: String, message: String },

    /// I/O errors (bind failures, socket errors, etc.)
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl BalancerError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a backend connection error for the named backend
    pub fn backend_connect<S: Into<String>>(backend: S, source: std::io::Error) -> Self {
        Self::BackendConnect {
            backend: backend.into(),
            message: source.to_string(),
        }
    }
}

impl From<std::io::Error> for BalancerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = BalancerError::config("missing backends");
        assert_eq!(err.to_string(), "Configuration error: missing backends");

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = BalancerError::backend_connect("serv1", io);
        assert_eq!(err.to_string(), "Backend connect failed: serv1 - refused");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        let err: BalancerError = io.into();
        assert!(matches!(err, BalancerError::Io { .. }));
    }
}
