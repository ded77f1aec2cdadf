//! Body collection for chunked, push-based response delivery.
//!
//! A [`BodyCollector`] accumulates chunks into one fixed-capacity buffer and
//! resolves a one-shot promise when delivery completes or fails. The
//! consumer holds the matching [`PendingBody`] and blocks on it.
//!
//! ```text
//! delivery task                          caller thread
//! ─────────────                          ─────────────
//! subscribe(stream)
//!   on_next(chunk) ─┐
//!   on_next(chunk)  ├─► buffer[0..position]
//!   on_complete() ──┴─► oneshot ───────► PendingBody::wait()
//! ```
//!
//! Each request gets its own collector; one is never shared between
//! exchanges.

use futures::{Stream, StreamExt};
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::TransportError;

type BodyResult = Result<Vec<u8>, TransportError>;

/// How a collector's delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// All chunks arrived; `len` bytes were handed to the consumer.
    Complete { len: usize },
    /// Delivery failed; the consumer received the error.
    Failed,
}

/// Accumulates a chunked body into a fixed-capacity buffer.
pub struct BodyCollector {
    buffer: Box<[u8]>,
    position: usize,
    promise: Option<oneshot::Sender<BodyResult>>,
}

/// Blocking accessor for a body being collected elsewhere.
#[derive(Debug)]
pub struct PendingBody {
    receiver: oneshot::Receiver<BodyResult>,
}

impl BodyCollector {
    /// Create a collector with room for `capacity` bytes, and its consumer half.
    pub fn new(capacity: usize) -> (Self, PendingBody) {
        let (promise, receiver) = oneshot::channel();
        let collector = Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            position: 0,
            promise: Some(promise),
        };
        (collector, PendingBody { receiver })
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Append a chunk at the current write position.
    ///
    /// # Errors
    ///
    /// [`TransportError::PayloadTooLarge`] if the chunk does not fit. Nothing
    /// is written in that case.
    pub fn on_next(&mut self, chunk: &[u8]) -> Result<(), TransportError> {
        let end = self.position + chunk.len();
        if end > self.buffer.len() {
            return Err(TransportError::PayloadTooLarge {
                limit: self.buffer.len(),
            });
        }
        self.buffer[self.position..end].copy_from_slice(chunk);
        self.position = end;
        Ok(())
    }

    /// Resolve the pending body with `error` and rewind the buffer.
    pub fn on_error(&mut self, error: TransportError) {
        self.position = 0;
        self.resolve(Err(error));
    }

    /// Hand the written bytes to the consumer and rewind the buffer.
    ///
    /// Returns the number of bytes delivered.
    pub fn on_complete(&mut self) -> usize {
        let payload = self.buffer[..self.position].to_vec();
        self.position = 0;
        let len = payload.len();
        self.resolve(Ok(payload));
        len
    }

    /// Drain `stream` into the buffer.
    ///
    /// Demand is unbounded: every chunk is pulled as soon as it is available,
    /// since the total size is capped by the buffer.
    pub async fn subscribe<S, B, E>(mut self, stream: S) -> Delivery
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<TransportError>,
    {
        let mut stream = std::pin::pin!(stream);

        while let Some(item) = stream.next().await {
            let appended = match item {
                Ok(chunk) => self.on_next(chunk.as_ref()),
                Err(e) => Err(e.into()),
            };
            if let Err(error) = appended {
                self.on_error(error);
                return Delivery::Failed;
            }
        }

        let len = self.on_complete();
        trace!(bytes = len, "Response body collected");
        Delivery::Complete { len }
    }

    fn resolve(&mut self, result: BodyResult) {
        if let Some(promise) = self.promise.take() {
            // Receiver gone means the caller stopped waiting.
            let _ = promise.send(result);
        }
    }
}

impl PendingBody {
    /// Block until the body is complete.
    ///
    /// Must not be called from within an async runtime.
    ///
    /// # Errors
    ///
    /// The delivery error, or [`TransportError::Interrupted`] if the
    /// collector was dropped without resolving.
    pub fn wait(self) -> Result<Vec<u8>, TransportError> {
        self.receiver
            .blocking_recv()
            .map_err(|_| TransportError::Interrupted)?
    }
}
