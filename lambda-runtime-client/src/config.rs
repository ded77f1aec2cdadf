//! Runtime client configuration.

use std::time::Duration;

use crate::error::ConfigError;
use crate::transport::TransportKind;
use crate::MAX_PAYLOAD_SIZE;

/// Environment variable carrying the runtime API `host:port`.
pub const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

/// Environment variable selecting the transport (`single`, `pooled`, `non-blocking`).
pub const TRANSPORT_ENV: &str = "LAMBDA_RUNTIME_TRANSPORT";

/// Default connect timeout (one day, the practical maximum).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Default idle connections kept by the pooled transports.
pub const DEFAULT_POOL_MAX_IDLE: usize = 4;

/// Configuration for a [`RuntimeClient`](crate::client::RuntimeClient).
///
/// The endpoint is validated on construction; everything else has a default.
///
/// # Example
///
/// ```
/// use lambda_runtime_client::{RuntimeClientConfig, TransportKind};
///
/// let config = RuntimeClientConfig::new("127.0.0.1:9001")
///     .unwrap()
///     .with_transport(TransportKind::NonBlocking);
///
/// assert_eq!(config.endpoint(), "127.0.0.1:9001");
/// assert_eq!(config.request_timeout(), None);
/// assert_eq!(config.max_payload_size(), 6 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeClientConfig {
    /// Runtime API address, `host:port`
    endpoint: String,
    /// Transport strategy
    transport: TransportKind,
    /// Time allowed to establish a connection
    connect_timeout: Duration,
    /// Overall request timeout; `None` lets the long-poll block indefinitely
    request_timeout: Option<Duration>,
    /// Largest response body any transport will capture
    max_payload_size: usize,
    /// Idle connections kept per host
    pool_max_idle: usize,
}

impl RuntimeClientConfig {
    /// Create a configuration for `endpoint` with default settings.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEndpoint`] unless `endpoint` is a bare `host:port`
    /// (no scheme, path or whitespace).
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        let endpoint = validate_endpoint(endpoint.into())?;
        Ok(Self {
            endpoint,
            transport: TransportKind::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
            max_payload_size: MAX_PAYLOAD_SIZE,
            pool_max_idle: DEFAULT_POOL_MAX_IDLE,
        })
    }

    /// Load from the process environment.
    ///
    /// Reads the endpoint from `AWS_LAMBDA_RUNTIME_API` and, if set, the
    /// transport from `LAMBDA_RUNTIME_TRANSPORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(RUNTIME_API_ENV).ok_or(ConfigError::MissingEnv(RUNTIME_API_ENV))?;
        let mut config = Self::new(endpoint)?;

        if let Some(transport) = lookup(TRANSPORT_ENV) {
            config.transport = transport.parse()?;
        }
        Ok(config)
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set an overall request timeout.
    ///
    /// Leave unset in production: the "next invocation" call may legitimately
    /// block for as long as the platform has no work.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    pub fn with_pool_max_idle(mut self, idle: usize) -> Self {
        self.pool_max_idle = idle;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    pub fn pool_max_idle(&self) -> usize {
        self.pool_max_idle
    }
}

fn validate_endpoint(endpoint: String) -> Result<String, ConfigError> {
    let trimmed = endpoint.trim();
    let valid = !trimmed.is_empty()
        && !trimmed.contains("://")
        && !trimmed.contains('/')
        && !trimmed.contains(char::is_whitespace);

    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidEndpoint(endpoint))
    }
}
