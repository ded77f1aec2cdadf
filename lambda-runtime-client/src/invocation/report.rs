//! Error reports posted to the "invocation error" and "init error" endpoints.

/// Error type header.
pub const ERROR_TYPE_HEADER: &str = "Lambda-Runtime-Function-Error-Type";

/// X-Ray error cause header.
pub const ERROR_CAUSE_HEADER: &str = "Lambda-Runtime-Function-XRay-Error-Cause";

/// Exclusive upper bound on the encoded error cause (1 MiB).
///
/// The platform forwards the cause as a tracing header with its own size
/// ceiling, so oversized causes are dropped whole rather than truncated.
pub const ERROR_CAUSE_MAX_SIZE: usize = 1024 * 1024;

/// A failure report for the platform.
///
/// Built with [`InvocationError::builder`]. Optional fields are either fully
/// present and within bounds, or absent; an empty value is never sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationError {
    id: Option<String>,
    error_payload: Vec<u8>,
    error_type: Option<String>,
    error_cause: Option<String>,
}

impl InvocationError {
    /// Start building a report around the serialized error body.
    pub fn builder(error_payload: impl Into<Vec<u8>>) -> InvocationErrorBuilder {
        InvocationErrorBuilder {
            report: InvocationError {
                id: None,
                error_payload: error_payload.into(),
                error_type: None,
                error_cause: None,
            },
        }
    }

    /// Request ID the report belongs to. Absent for init errors.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn error_payload(&self) -> &[u8] {
        &self.error_payload
    }

    pub fn error_type(&self) -> Option<&str> {
        self.error_type.as_deref()
    }

    pub fn error_cause(&self) -> Option<&str> {
        self.error_cause.as_deref()
    }
}

/// Builder for [`InvocationError`].
///
/// # Example
///
/// ```
/// use lambda_runtime_client::InvocationError;
///
/// let report = InvocationError::builder(b"{}".to_vec())
///     .with_id("8476a536-e9f4-11e8-9739-2dfe598c3fcd")
///     .with_error_type("Runtime.HandlerError")
///     .with_error_cause("")
///     .build();
///
/// assert_eq!(report.error_type(), Some("Runtime.HandlerError"));
/// assert_eq!(report.error_cause(), None);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct InvocationErrorBuilder {
    report: InvocationError,
}

impl InvocationErrorBuilder {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.report.id = Some(id.into());
        self
    }

    /// Set the error type. Empty values are discarded.
    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        let error_type = error_type.into();
        if !error_type.is_empty() {
            self.report.error_type = Some(error_type);
        }
        self
    }

    /// Set the X-Ray error cause.
    ///
    /// Empty values and values of [`ERROR_CAUSE_MAX_SIZE`] bytes or more are
    /// discarded.
    pub fn with_error_cause(mut self, error_cause: impl Into<String>) -> Self {
        let error_cause = error_cause.into();
        if !error_cause.is_empty() && error_cause.len() < ERROR_CAUSE_MAX_SIZE {
            self.report.error_cause = Some(error_cause);
        }
        self
    }

    pub fn build(self) -> InvocationError {
        self.report
    }
}
