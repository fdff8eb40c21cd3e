//! The request/response transport contract.

use crate::error::TransportResult;
use async_trait::async_trait;
use serde_json::Value;

/// Sends rendered query strings to the server and returns the response
/// payload: a JSON object mapping each top-level query alias to its
/// nested response object.
///
/// The request string is exactly what the query builder produced;
/// implementations wrap it in whatever envelope the endpoint expects.
/// Retry policy, sessions, and authentication belong to implementations,
/// not to the engine.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request and waits for the response payload.
    async fn send(&self, request: &str) -> TransportResult<Value>;
}

/// Mock transport and event channel for testing.
pub mod mock {
    use super::*;
    use crate::channel::EventChannel;
    use crate::error::TransportError;
    use courtside_types::PushEvent;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tracing::debug;

    /// Extracts the top-level query root from a rendered request string
    /// (`team(id: 7){...}` → `team`).
    #[must_use]
    pub fn query_root(request: &str) -> &str {
        let end = request
            .find(|c| c == '(' || c == '{')
            .unwrap_or(request.len());
        request[..end].trim()
    }

    /// A mock transport serving canned payloads keyed by query root.
    ///
    /// Every sent request is logged so tests can assert how many reloads a
    /// code path triggered. Responses are cloned on each send, so repeated
    /// loads of the same root are idempotent unless the test swaps the
    /// canned payload in between.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<String, Value>>,
        sent: Mutex<Vec<String>>,
        failures: Mutex<VecDeque<TransportError>>,
    }

    impl MockTransport {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers (or replaces) the canned payload for a query root.
        pub fn respond(&self, root: impl Into<String>, payload: Value) {
            self.responses.lock().unwrap().insert(root.into(), payload);
        }

        /// Queues a failure for the next send.
        pub fn fail_next(&self, error: TransportError) {
            self.failures.lock().unwrap().push_back(error);
        }

        /// All requests sent so far, in order.
        #[must_use]
        pub fn sent_requests(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        /// How many sent requests targeted the given query root.
        #[must_use]
        pub fn request_count(&self, root: &str) -> usize {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|r| query_root(r) == root)
                .count()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: &str) -> TransportResult<Value> {
            debug!(%request, "mock send");
            self.sent.lock().unwrap().push(request.to_string());

            if let Some(error) = self.failures.lock().unwrap().pop_front() {
                return Err(error);
            }

            let root = query_root(request);
            let payload = self.responses.lock().unwrap().get(root).cloned();
            Ok(match payload {
                Some(payload) => json!({ root: payload }),
                // Reached the server, nothing matched: zero-result success.
                None => json!({}),
            })
        }
    }

    /// A mock event channel backed by an in-process queue.
    pub struct MockEventChannel {
        receiver: mpsc::UnboundedReceiver<PushEvent>,
    }

    impl MockEventChannel {
        /// Creates a channel and the sender half tests push events through.
        #[must_use]
        pub fn pair() -> (Self, mpsc::UnboundedSender<PushEvent>) {
            let (sender, receiver) = mpsc::unbounded_channel();
            (Self { receiver }, sender)
        }
    }

    #[async_trait]
    impl EventChannel for MockEventChannel {
        async fn recv(&mut self) -> Option<PushEvent> {
            self.receiver.recv().await
        }
    }
}
