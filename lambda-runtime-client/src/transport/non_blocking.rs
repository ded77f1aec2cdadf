//! Event-driven transport backed by the async `reqwest` client.
//!
//! Each exchange runs as a task on a runtime owned by the transport. The task
//! feeds response events into an [`ExchangeHandler`]:
//!
//! ```text
//! AwaitingHeaders ──on_headers──► AwaitingBody ──on_stream──► Complete
//!        │                             │
//!        └──────────on_error───────────┴───────────────────► Failed
//! ```
//!
//! The calling thread blocks on the matching [`PendingExchange`], which
//! resolves once for the head and once for the body.

use futures::Stream;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use reqwest::Client;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use super::body::{BodyCollector, Delivery, PendingBody};
use super::{RuntimeRequest, RuntimeResponse, Transport};
use crate::config::RuntimeClientConfig;
use crate::error::TransportError;

/// Non-blocking transport: async HTTP on a dedicated runtime, bridged back to
/// the caller through a [`BodyCollector`].
pub struct NonBlockingTransport {
    client: Client,
    runtime: Runtime,
    max_payload_size: usize,
}

impl NonBlockingTransport {
    /// Creates the transport and starts its I/O runtime.
    ///
    /// Must be created and dropped outside of any async runtime.
    pub fn new(config: &RuntimeClientConfig) -> Result<Self, TransportError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("runtime-api-io")
            .enable_all()
            .build()
            .map_err(TransportError::Runtime)?;

        let mut builder = Client::builder()
            .http1_only()
            .redirect(Policy::none())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle())
            .tcp_nodelay(true);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::ClientBuild)?;

        Ok(Self {
            client,
            runtime,
            max_payload_size: config.max_payload_size(),
        })
    }
}

impl Transport for NonBlockingTransport {
    fn execute(&self, request: RuntimeRequest) -> Result<RuntimeResponse, TransportError> {
        let (handler, pending) = ExchangeHandler::new(self.max_payload_size);
        self.runtime.spawn(deliver(self.client.clone(), request, handler));
        pending.wait()
    }
}

/// Run one exchange, reporting every event to `handler`.
async fn deliver(client: Client, request: RuntimeRequest, mut handler: ExchangeHandler) {
    let url = request.url().to_string();
    trace!(url = %url, method = %request.method(), "HTTP request starting");

    let mut builder = client.request(request.method().clone(), url.as_str());
    for (name, value) in request.headers() {
        builder = builder.header(*name, value.as_str());
    }
    if let Some(body) = request.into_body() {
        builder = builder.body(body);
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(
                url = %url,
                error = %e,
                is_connect = e.is_connect(),
                is_timeout = e.is_timeout(),
                "HTTP request failed"
            );
            handler.on_error(TransportError::Request(e));
            return;
        }
    };

    let status = response.status().as_u16();
    debug!(url = %url, status, "HTTP response received");

    handler.on_headers(status, response.headers().clone());
    handler.on_stream(response.bytes_stream()).await;
}

/// Phase of an [`ExchangeHandler`], reported when an event arrives out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExchangePhase {
    AwaitingHeaders,
    AwaitingBody,
    Complete,
    Failed,
}

enum ExchangeState {
    AwaitingHeaders {
        head: oneshot::Sender<Result<ResponseHead, TransportError>>,
        body: BodyCollector,
    },
    AwaitingBody {
        body: BodyCollector,
    },
    Complete,
    Failed,
}

#[derive(Debug)]
struct ResponseHead {
    status: u16,
    headers: HeaderMap,
}

/// Callback-driven response handler for one exchange.
///
/// Owns a fresh [`BodyCollector`] per exchange. Events that do not fit the
/// current phase are logged and ignored.
pub struct ExchangeHandler {
    state: ExchangeState,
}

/// The caller's half of an exchange.
#[derive(Debug)]
pub struct PendingExchange {
    head: oneshot::Receiver<Result<ResponseHead, TransportError>>,
    body: PendingBody,
}

impl ExchangeHandler {
    /// Create a handler whose body is bounded by `max_payload_size`.
    pub fn new(max_payload_size: usize) -> (Self, PendingExchange) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body, pending_body) = BodyCollector::new(max_payload_size);

        let handler = Self {
            state: ExchangeState::AwaitingHeaders {
                head: head_tx,
                body,
            },
        };
        let pending = PendingExchange {
            head: head_rx,
            body: pending_body,
        };
        (handler, pending)
    }

    pub(crate) fn phase(&self) -> ExchangePhase {
        match self.state {
            ExchangeState::AwaitingHeaders { .. } => ExchangePhase::AwaitingHeaders,
            ExchangeState::AwaitingBody { .. } => ExchangePhase::AwaitingBody,
            ExchangeState::Complete => ExchangePhase::Complete,
            ExchangeState::Failed => ExchangePhase::Failed,
        }
    }

    /// Status line and headers arrived.
    pub fn on_headers(&mut self, status: u16, headers: HeaderMap) {
        match std::mem::replace(&mut self.state, ExchangeState::Failed) {
            ExchangeState::AwaitingHeaders { head, body } => {
                let _ = head.send(Ok(ResponseHead { status, headers }));
                self.state = ExchangeState::AwaitingBody { body };
            }
            other => {
                self.state = other;
                warn!(phase = ?self.phase(), "Headers delivered out of order");
            }
        }
    }

    /// The body stream is ready; drain it into the collector.
    pub async fn on_stream<S, B, E>(&mut self, stream: S)
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<TransportError>,
    {
        match std::mem::replace(&mut self.state, ExchangeState::Failed) {
            ExchangeState::AwaitingBody { body } => {
                self.state = match body.subscribe(stream).await {
                    Delivery::Complete { .. } => ExchangeState::Complete,
                    Delivery::Failed => ExchangeState::Failed,
                };
            }
            other => {
                self.state = other;
                warn!(phase = ?self.phase(), "Body stream delivered out of order");
            }
        }
    }

    /// The exchange failed before or during body delivery.
    pub fn on_error(&mut self, error: TransportError) {
        match std::mem::replace(&mut self.state, ExchangeState::Failed) {
            ExchangeState::AwaitingHeaders { head, .. } => {
                let _ = head.send(Err(error));
            }
            ExchangeState::AwaitingBody { mut body } => body.on_error(error),
            other => {
                self.state = other;
                warn!(phase = ?self.phase(), error = %error, "Error after exchange finished");
            }
        }
    }
}

impl PendingExchange {
    /// Block until the response head and the full body are available.
    ///
    /// Must not be called from within an async runtime.
    pub fn wait(self) -> Result<RuntimeResponse, TransportError> {
        let head = self
            .head
            .blocking_recv()
            .map_err(|_| TransportError::Interrupted)??;
        let body = self.body.wait()?;
        Ok(RuntimeResponse::new(head.status, head.headers, body))
    }
}
