//! Lambda Runtime Client - custom-runtime HTTP API client
//!
//! This library drives the invoke/respond/error cycle of the platform's
//! custom-runtime control API. A runtime process repeatedly asks the platform
//! for its next unit of work, blocks until one arrives, executes it, and
//! reports either a success payload or a structured error.
//!
//! # Protocol
//!
//! ```text
//! ┌──────────┐                                      ┌──────────┐
//! │ Runtime  │                                      │ Platform │
//! └────┬─────┘                                      └────┬─────┘
//!      │  GET /2018-06-01/runtime/invocation/next        │
//!      │ ──────────────────────────────────────────────► │
//!      │             ... (blocks until work) ...         │
//!      │  200 + payload, lambda-runtime-* headers        │
//!      │ ◄────────────────────────────────────────────── │
//!      │                                                 │
//!      │  POST /2018-06-01/runtime/invocation/{id}/response
//!      │ ──────────────────────────────────────────────► │
//!      │        or                                       │
//!      │  POST /2018-06-01/runtime/invocation/{id}/error │
//!      │ ──────────────────────────────────────────────► │
//!      │  202 Accepted                                   │
//!      │ ◄────────────────────────────────────────────── │
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lambda_runtime_client::{RuntimeClient, RuntimeClientConfig, InvocationError};
//!
//! let config = RuntimeClientConfig::from_env()?;
//! let client = RuntimeClient::from_config(&config)?;
//!
//! loop {
//!     let invocation = client.wait_for_next_invocation()?;
//!     match handle(invocation.content()) {
//!         Ok(output) => client.post_invocation_success(invocation.id(), &output)?,
//!         Err(e) => {
//!             let report = InvocationError::builder(e.to_json())
//!                 .with_id(invocation.id())
//!                 .with_error_type("Runtime.HandlerError")
//!                 .build();
//!             client.post_invocation_error(&report)?;
//!         }
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod invocation;
pub mod logging;
pub mod transport;

pub use client::RuntimeClient;
pub use config::RuntimeClientConfig;
pub use error::{ConfigError, RuntimeClientError, TransportError};
pub use invocation::{InvocationError, InvocationErrorBuilder, InvocationRequest};
pub use transport::{Transport, TransportKind};

/// Version of the runtime client library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent attached to every request sent to the runtime API.
pub const USER_AGENT: &str = concat!("aws-lambda-rust/", env!("CARGO_PKG_VERSION"));

/// Maximum invocation payload the platform will deliver (6 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 6 * 1024 * 1024;
