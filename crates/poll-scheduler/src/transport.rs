//! Transport Query Interface
//!
//! The diagnostic bus is a single half-duplex channel: implementors must
//! guarantee at most one in-flight request system-wide, queueing concurrent
//! callers rather than interleaving responses.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Errors from a single transport round-trip. All of them are recoverable
/// from the scheduler's point of view: the batch is retried next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No matching response arrived in time.
    #[error("no response within {ms}ms")]
    Timeout { ms: u64 },

    /// The underlying link failed mid-request.
    #[error("transport I/O error: {0}")]
    Io(String),

    /// The adapter is not connected.
    #[error("transport disconnected")]
    Disconnected,
}

/// Request/response access to the diagnostic adapter.
///
/// `header` selects the target ECU bus address; `None` keeps whatever header
/// the adapter last used.
pub trait Transport: Send + Sync {
    fn query(
        &self,
        cmd: &str,
        header: Option<&str>,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// In-memory transport double: canned command→response table plus a query
/// counter, for tests that need no hardware.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub the response returned for `cmd`. Unstubbed commands time out.
    pub fn stub(&self, cmd: &str, response: &str) {
        self.responses
            .lock()
            .expect("mock responses lock")
            .insert(cmd.to_string(), response.to_string());
    }

    /// Total queries issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn query(
        &self,
        cmd: &str,
        _header: Option<&str>,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, TransportError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .lock()
            .expect("mock responses lock")
            .get(cmd)
            .cloned();
        async move {
            response.ok_or(TransportError::Timeout {
                ms: timeout.as_millis() as u64,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stubbed_command_answers() {
        let transport = MockTransport::new();
        transport.stub("01 0D", "410D28");
        let resp = transport
            .query("01 0D", Some("7E0"), Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(resp, "410D28");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn unstubbed_command_times_out() {
        let transport = MockTransport::new();
        let err = transport
            .query("01 0C", None, Duration::from_millis(250))
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Timeout { ms: 250 });
    }
}
