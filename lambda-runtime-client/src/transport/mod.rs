//! HTTP execution strategies for the runtime API.
//!
//! The [`RuntimeClient`](crate::client::RuntimeClient) builds protocol
//! requests and hands them to a [`Transport`]. Three interchangeable
//! implementations are provided:
//!
//! | Transport | Connections | Delivery |
//! |---|---|---|
//! | [`SingleConnectionTransport`] | one, reused, exchanges serialized | blocking |
//! | [`PooledTransport`] | pooled blocking connections | blocking |
//! | [`NonBlockingTransport`] | async client on an owned runtime | chunked, via [`BodyCollector`] |
//!
//! They differ only in connection lifecycle and delivery mechanism. Request
//! and response shapes, header lookup and the payload bound are identical.

mod blocking;
mod body;
mod non_blocking;

pub use blocking::{PooledTransport, SingleConnectionTransport};
pub use body::{BodyCollector, Delivery, PendingBody};
pub use non_blocking::{ExchangeHandler, NonBlockingTransport, PendingExchange};

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use reqwest::header::HeaderMap;
use reqwest::Method;

use crate::config::RuntimeClientConfig;
use crate::error::{ConfigError, TransportError};

/// A pluggable HTTP execution strategy.
///
/// Implementations block the calling thread until the full response body is
/// available (or the exchange fails). No retries are attempted.
pub trait Transport: Send + Sync {
    /// Execute a prepared request and return the complete response.
    fn execute(&self, request: RuntimeRequest) -> Result<RuntimeResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: RuntimeRequest) -> Result<RuntimeResponse, TransportError> {
        (**self).execute(request)
    }
}

/// A fully prepared request: method, URL, headers and optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeRequest {
    method: Method,
    url: String,
    headers: Vec<(&'static str, String)>,
    body: Option<Vec<u8>>,
}

impl RuntimeRequest {
    /// A bodyless GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST carrying raw bytes.
    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    /// Append a header.
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(&'static str, String)] {
        &self.headers
    }

    /// First value of a request header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub(crate) fn into_body(self) -> Option<Vec<u8>> {
        self.body
    }
}

/// A complete response: status, headers and the captured body.
#[derive(Debug, Clone)]
pub struct RuntimeResponse {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl RuntimeResponse {
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Look up a response header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (u16, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

/// First value of `name` as visible ASCII. Other values read as absent.
pub(crate) fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// First value of `name` decoded as UTF-8, invalid sequences replaced.
///
/// Absent only when the header is absent.
pub(crate) fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
}

/// Which transport a client is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// One blocking connection, exchanges serialized.
    SingleConnection,
    /// Pooled blocking connections.
    #[default]
    Pooled,
    /// Event-driven async client with chunked body delivery.
    NonBlocking,
}

impl TransportKind {
    pub fn name(&self) -> &'static str {
        match self {
            TransportKind::SingleConnection => "single",
            TransportKind::Pooled => "pooled",
            TransportKind::NonBlocking => "non-blocking",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "single-connection" => Ok(TransportKind::SingleConnection),
            "pooled" => Ok(TransportKind::Pooled),
            "non-blocking" | "nonblocking" | "async" => Ok(TransportKind::NonBlocking),
            _ => Err(ConfigError::UnknownTransport(s.to_string())),
        }
    }
}

/// Build the transport selected by `config`.
pub fn create_transport(config: &RuntimeClientConfig) -> Result<Box<dyn Transport>, TransportError> {
    Ok(match config.transport() {
        TransportKind::SingleConnection => Box::new(SingleConnectionTransport::new(config)?),
        TransportKind::Pooled => Box::new(PooledTransport::new(config)?),
        TransportKind::NonBlocking => Box::new(NonBlockingTransport::new(config)?),
    })
}

#[cfg(test)]
pub use tests::MockTransport;
