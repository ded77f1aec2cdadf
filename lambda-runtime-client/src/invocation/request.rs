//! The invocation record returned by the "next invocation" call.

use std::borrow::Cow;
use std::io::Cursor;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;

use crate::error::{Result, RuntimeClientError};
use crate::transport::header_text;

/// Request ID header (mandatory).
pub const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";
/// Invoked function ARN header (mandatory).
pub const FUNCTION_ARN_HEADER: &str = "lambda-runtime-invoked-function-arn";
/// Deadline header, milliseconds since the Unix epoch.
pub const DEADLINE_MS_HEADER: &str = "lambda-runtime-deadline-ms";
/// X-Ray trace ID header.
pub const TRACE_ID_HEADER: &str = "lambda-runtime-trace-id";
/// Client context header, set for mobile-client invocations.
pub const CLIENT_CONTEXT_HEADER: &str = "lambda-runtime-client-context";
/// Cognito identity header.
pub const COGNITO_IDENTITY_HEADER: &str = "lambda-runtime-cognito-identity";

/// One unit of work pulled from the platform.
///
/// Immutable once constructed. The mandatory fields (`id`,
/// `invoked_function_arn`) are never empty: construction fails instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    id: String,
    invoked_function_arn: String,
    deadline_ms: u64,
    xray_trace_id: Option<String>,
    client_context: Option<String>,
    cognito_identity: Option<String>,
    content: Vec<u8>,
}

impl InvocationRequest {
    /// Build an invocation from the "next" response headers and body.
    ///
    /// # Errors
    ///
    /// - [`RuntimeClientError::ProtocolViolation`] if the request ID or the
    ///   function ARN header is missing
    /// - [`RuntimeClientError::NumericParse`] if the deadline header is not
    ///   a base-10 integer
    pub fn from_parts(headers: &HeaderMap, content: Vec<u8>) -> Result<Self> {
        let id = mandatory(headers, REQUEST_ID_HEADER, "Request ID absent")?;
        let invoked_function_arn = mandatory(headers, FUNCTION_ARN_HEADER, "Function ARN absent")?;

        let deadline_ms = match header_text(headers, DEADLINE_MS_HEADER) {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|source| RuntimeClientError::NumericParse {
                    header: DEADLINE_MS_HEADER,
                    value: raw.to_string(),
                    source,
                })?,
            None => 0,
        };

        Ok(Self {
            id,
            invoked_function_arn,
            deadline_ms,
            xray_trace_id: optional(headers, TRACE_ID_HEADER),
            client_context: optional(headers, CLIENT_CONTEXT_HEADER),
            cognito_identity: optional(headers, COGNITO_IDENTITY_HEADER),
            content,
        })
    }

    /// The platform's request ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// ARN of the invoked function.
    pub fn invoked_function_arn(&self) -> &str {
        &self.invoked_function_arn
    }

    /// Deadline in milliseconds since the Unix epoch, 0 if the platform sent none.
    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// Deadline as a wall-clock time.
    pub fn deadline(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.deadline_ms)
    }

    pub fn xray_trace_id(&self) -> Option<&str> {
        self.xray_trace_id.as_deref()
    }

    pub fn client_context(&self) -> Option<&str> {
        self.client_context.as_deref()
    }

    pub fn cognito_identity(&self) -> Option<&str> {
        self.cognito_identity.as_deref()
    }

    /// Raw invocation payload.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Payload as a reader, for deserializers that consume `io::Read`.
    pub fn content_as_reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.content.as_slice())
    }

    /// Consume the invocation, keeping only the payload.
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

fn mandatory(headers: &HeaderMap, name: &str, absent: &'static str) -> Result<String> {
    header_text(headers, name)
        .filter(|value| !value.is_empty())
        .map(Cow::into_owned)
        .ok_or_else(|| RuntimeClientError::protocol(absent))
}

fn optional(headers: &HeaderMap, name: &str) -> Option<String> {
    header_text(headers, name).map(Cow::into_owned)
}
