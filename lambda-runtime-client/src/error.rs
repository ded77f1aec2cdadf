//! Error types for the runtime API client.
//!
//! Failures are split by layer: [`TransportError`] for anything below the
//! protocol (connection, body delivery), [`RuntimeClientError`] for what the
//! caller sees from a protocol operation, and [`ConfigError`] for client setup.
//! None of these are retried inside the crate.

use std::num::ParseIntError;
use thiserror::Error;

/// Result alias for runtime client operations.
pub type Result<T, E = RuntimeClientError> = std::result::Result<T, E>;

/// Errors raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connect, reset, malformed response).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The async runtime backing the non-blocking transport could not start.
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Reading a blocking response body failed part way.
    #[error("Failed to read response body: {0}")]
    BodyRead(#[source] std::io::Error),

    /// Response body exceeded the payload bound.
    #[error("Response body exceeds maximum payload size of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The delivering side went away before resolving the pending result.
    #[error("Response delivery interrupted before completion")]
    Interrupted,
}

/// Errors surfaced by [`RuntimeClient`](crate::client::RuntimeClient) operations.
#[derive(Debug, Error)]
pub enum RuntimeClientError {
    /// The platform's response broke the API contract.
    ///
    /// Fatal for the current operation.
    #[error("{0}")]
    ProtocolViolation(String),

    /// The underlying transport failed.
    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: TransportError,
    },

    /// A numeric header was present but not a valid integer.
    #[error("Invalid {header} header '{value}': {source}")]
    NumericParse {
        header: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl RuntimeClientError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        RuntimeClientError::ProtocolViolation(message.into())
    }

    pub(crate) fn transport(context: &'static str) -> impl FnOnce(TransportError) -> Self {
        move |source| RuntimeClientError::Transport { context, source }
    }

    /// Returns true if this is a protocol contract violation.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, RuntimeClientError::ProtocolViolation(_))
    }
}

/// Client configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("Environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// The endpoint is not a bare `host:port`.
    #[error("Invalid runtime API endpoint '{0}' - expected host:port")]
    InvalidEndpoint(String),

    /// Unknown transport name.
    #[error("Unknown transport '{0}' - expected single, pooled or non-blocking")]
    UnknownTransport(String),
}
