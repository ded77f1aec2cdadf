//! Runtime API protocol driver.
//!
//! [`RuntimeClient`] turns the four runtime API operations into transport
//! requests and validates what comes back. It holds no per-invocation state;
//! the caller owns the poll loop and any retry policy.

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::config::RuntimeClientConfig;
use crate::error::{Result, RuntimeClientError, TransportError};
use crate::invocation::{
    InvocationError, InvocationRequest, ERROR_CAUSE_HEADER, ERROR_TYPE_HEADER,
};
use crate::transport::{create_transport, RuntimeRequest, Transport};
use crate::USER_AGENT;

const API_VERSION: &str = "2018-06-01";
const CONTENT_TYPE_JSON: &str = "application/json";

/// Client for the custom-runtime HTTP API.
///
/// Bound to one `host:port` endpoint for its whole lifetime. Every request
/// carries the [`USER_AGENT`] header.
pub struct RuntimeClient<T: Transport = Box<dyn Transport>> {
    endpoint: String,
    transport: T,
}

impl RuntimeClient {
    /// Creates a client using the transport selected by `config`.
    pub fn from_config(config: &RuntimeClientConfig) -> Result<Self, TransportError> {
        let transport = create_transport(config)?;
        info!(
            endpoint = config.endpoint(),
            transport = %config.transport(),
            "Runtime client created"
        );
        Ok(Self::new(config.endpoint(), transport))
    }
}

impl<T: Transport> RuntimeClient<T> {
    /// Creates a client over an existing transport.
    pub fn new(endpoint: impl Into<String>, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Block until the platform hands out the next invocation.
    ///
    /// The wait is unbounded unless a request timeout was configured.
    ///
    /// # Errors
    ///
    /// - [`RuntimeClientError::Transport`] if the exchange fails
    /// - [`RuntimeClientError::ProtocolViolation`] with `"Request ID absent"`
    ///   or `"Function ARN absent"` if a mandatory header is missing
    /// - [`RuntimeClientError::NumericParse`] for a malformed deadline
    pub fn wait_for_next_invocation(&self) -> Result<InvocationRequest> {
        let url = self.url("invocation/next");
        debug!(url = %url, "Waiting for next invocation");

        let response = self
            .transport
            .execute(RuntimeRequest::get(&url).with_header("User-Agent", USER_AGENT))
            .map_err(RuntimeClientError::transport("Failed to get next invoke"))?;

        let success =
            StatusCode::from_u16(response.status()).is_ok_and(|code| code.is_success());
        if !success {
            // Mandatory header validation decides whether this is usable.
            warn!(url = %url, status = response.status(), "Unexpected status for next invocation");
        }

        let (_, headers, body) = response.into_parts();
        let invocation = InvocationRequest::from_parts(&headers, body)?;
        debug!(
            request_id = invocation.id(),
            bytes = invocation.content().len(),
            deadline_ms = invocation.deadline_ms(),
            "Invocation received"
        );
        Ok(invocation)
    }

    /// Report a successful result for invocation `id`.
    ///
    /// The response status is not checked.
    pub fn post_invocation_success(&self, id: &str, payload: &[u8]) -> Result<()> {
        let url = self.url(&format!("invocation/{id}/response"));
        let request = RuntimeRequest::post(&url, payload).with_header("User-Agent", USER_AGENT);

        let response = self
            .transport
            .execute(request)
            .map_err(RuntimeClientError::transport("Failed to post invocation result"))?;
        debug!(url = %url, status = response.status(), "Invocation result posted");
        Ok(())
    }

    /// Report a failed invocation.
    ///
    /// # Errors
    ///
    /// A [`ProtocolViolation`](RuntimeClientError::ProtocolViolation) if the
    /// report carries no request ID (nothing is sent) or the platform answers
    /// with anything but 202.
    pub fn post_invocation_error(&self, error: &InvocationError) -> Result<()> {
        let id = error
            .id()
            .ok_or_else(|| RuntimeClientError::protocol("Request ID absent from error report"))?;
        let url = self.url(&format!("invocation/{id}/error"));
        self.post_error(url, error)
    }

    /// Report a failure during runtime initialization.
    ///
    /// Any request ID on the report is ignored.
    pub fn post_init_error(&self, error: &InvocationError) -> Result<()> {
        let url = self.url("init/error");
        self.post_error(url, error)
    }

    fn post_error(&self, url: String, error: &InvocationError) -> Result<()> {
        let mut request = RuntimeRequest::post(&url, error.error_payload())
            .with_header("User-Agent", USER_AGENT)
            .with_header("Content-Type", CONTENT_TYPE_JSON);
        if let Some(error_type) = error.error_type() {
            request = request.with_header(ERROR_TYPE_HEADER, error_type);
        }
        if let Some(cause) = error.error_cause() {
            request = request.with_header(ERROR_CAUSE_HEADER, cause);
        }

        let status = self
            .transport
            .execute(request)
            .map_err(RuntimeClientError::transport("Failed to post error"))?
            .status();

        if status != StatusCode::ACCEPTED.as_u16() {
            warn!(url = %url, status, "Error report rejected");
            return Err(RuntimeClientError::protocol(format!(
                "{url} Response code: '{status}'."
            )));
        }
        debug!(url = %url, error_type = ?error.error_type(), "Error report posted");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}/{API_VERSION}/runtime/{path}", self.endpoint)
    }
}
