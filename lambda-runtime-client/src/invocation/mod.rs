//! Values exchanged with the runtime API.
//!
//! - [`InvocationRequest`]: one unit of work pulled from the platform
//! - [`InvocationError`]: a failure report sent back to the platform

mod report;
mod request;

pub use report::{
    InvocationError, InvocationErrorBuilder, ERROR_CAUSE_HEADER, ERROR_CAUSE_MAX_SIZE,
    ERROR_TYPE_HEADER,
};
pub use request::{
    InvocationRequest, CLIENT_CONTEXT_HEADER, COGNITO_IDENTITY_HEADER, DEADLINE_MS_HEADER,
    FUNCTION_ARN_HEADER, REQUEST_ID_HEADER, TRACE_ID_HEADER,
};
