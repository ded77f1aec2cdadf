//! Blocking transports backed by `reqwest::blocking`.

use std::io::Read;
use std::sync::Mutex;

use reqwest::blocking::{Client, Response};
use reqwest::redirect::Policy;
use tracing::{debug, trace, warn};

use super::{RuntimeRequest, RuntimeResponse, Transport};
use crate::config::RuntimeClientConfig;
use crate::error::TransportError;

/// Blocking transport over a single reused connection.
///
/// Keeps at most one idle connection and serializes exchanges, so every
/// request travels over the same socket while it stays open.
pub struct SingleConnectionTransport {
    client: Client,
    exchange: Mutex<()>,
    max_payload_size: usize,
}

impl SingleConnectionTransport {
    /// Creates a single-connection transport from the client configuration.
    pub fn new(config: &RuntimeClientConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(config, 1)?,
            exchange: Mutex::new(()),
            max_payload_size: config.max_payload_size(),
        })
    }
}

impl Transport for SingleConnectionTransport {
    fn execute(&self, request: RuntimeRequest) -> Result<RuntimeResponse, TransportError> {
        // A poisoned lock only means an earlier exchange panicked; the
        // connection itself is still usable.
        let _exchange = self
            .exchange
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        execute_blocking(&self.client, request, self.max_payload_size)
    }
}

/// Blocking transport over a connection pool.
///
/// Idle connections (up to `pool_max_idle`) are kept warm between calls.
#[derive(Clone)]
pub struct PooledTransport {
    client: Client,
    max_payload_size: usize,
}

impl PooledTransport {
    /// Creates a pooled transport from the client configuration.
    pub fn new(config: &RuntimeClientConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(config, config.pool_max_idle())?,
            max_payload_size: config.max_payload_size(),
        })
    }
}

impl Transport for PooledTransport {
    fn execute(&self, request: RuntimeRequest) -> Result<RuntimeResponse, TransportError> {
        execute_blocking(&self.client, request, self.max_payload_size)
    }
}

fn build_client(config: &RuntimeClientConfig, max_idle: usize) -> Result<Client, TransportError> {
    Client::builder()
        .http1_only()
        .redirect(Policy::none())
        .connect_timeout(config.connect_timeout())
        .timeout(config.request_timeout())
        .pool_max_idle_per_host(max_idle)
        .tcp_nodelay(true)
        .build()
        .map_err(TransportError::ClientBuild)
}

fn execute_blocking(
    client: &Client,
    request: RuntimeRequest,
    max_payload_size: usize,
) -> Result<RuntimeResponse, TransportError> {
    let url = request.url().to_string();
    trace!(url = %url, method = %request.method(), "HTTP request starting");

    let mut builder = client.request(request.method().clone(), url.as_str());
    for (name, value) in request.headers() {
        builder = builder.header(*name, value.as_str());
    }
    if let Some(body) = request.into_body() {
        builder = builder.body(body);
    }

    let response = builder.send().map_err(|e| {
        warn!(
            url = %url,
            error = %e,
            is_connect = e.is_connect(),
            is_timeout = e.is_timeout(),
            "HTTP request failed"
        );
        TransportError::Request(e)
    })?;

    let status = response.status().as_u16();
    debug!(url = %url, status, "HTTP response received");

    let headers = response.headers().clone();
    let body = read_bounded(response, max_payload_size)?;
    trace!(url = %url, bytes = body.len(), "HTTP response body read");

    Ok(RuntimeResponse::new(status, headers, body))
}

/// Read the whole body, failing once it grows past `limit`.
fn read_bounded(response: Response, limit: usize) -> Result<Vec<u8>, TransportError> {
    let expected = response
        .content_length()
        .map_or(0, |len| len.min(limit as u64) as usize);

    let mut body = Vec::with_capacity(expected);
    response
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(TransportError::BodyRead)?;

    if body.len() > limit {
        warn!(limit, "Response body exceeds payload bound");
        return Err(TransportError::PayloadTooLarge { limit });
    }
    Ok(body)
}
