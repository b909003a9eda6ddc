//! Provider error types.

use thiserror::Error;

/// Errors raised while provisioning fixtures against an IAM backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Admin credentials or the admin realm/client were rejected.
    #[error("authentication error: {message} (HTTP {status}: {body})")]
    Auth {
        /// What went wrong.
        message: String,
        /// HTTP status returned by the token endpoint.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A single resource operation was rejected by the server.
    #[error("{operation} failed (HTTP {status}): {body}")]
    Provision {
        /// Operation that failed, e.g. "create realm 'perf'".
        operation: String,
        /// HTTP status returned by the server.
        status: u16,
        /// Raw response body or a description of the unexpected shape.
        body: String,
        /// Whether the server reported that the resource already exists.
        conflict: bool,
    },

    /// Timeout or connection failure. Not retried internally.
    #[error("network error during {operation}: {message}")]
    TransientNetwork {
        /// Operation that was in flight.
        operation: String,
        /// Underlying transport error.
        message: String,
    },

    /// Invalid or missing configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Creates a provision error from a rejected response.
    pub fn provision(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Provision {
            operation: operation.into(),
            status,
            body: body.into(),
            conflict: false,
        }
    }

    /// Creates a provision error for a resource the server says already exists.
    pub fn conflict(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Provision {
            operation: operation.into(),
            status,
            body: body.into(),
            conflict: true,
        }
    }

    /// Classifies a transport-level `reqwest` failure.
    pub fn transport(operation: impl Into<String>, err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        Self::TransientNetwork {
            operation: operation.into(),
            message,
        }
    }

    /// Returns true if the server reported that the resource already exists.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Provision { conflict: true, .. })
    }

    /// Returns true for timeouts and connection failures.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork { .. })
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
