//! Mock implementations for testing.
//!
//! [`MockTransport`] records every request it receives together with its
//! cancel token and answers from a queue of scripted outcomes, including
//! calls that never settle until cancelled.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;

use crate::cancellation::CancelToken;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path.
    pub path: String,
    /// Query parameters.
    pub query: Option<Value>,
    /// Request body.
    pub body: Option<Value>,
    /// Token the transport was handed for this call.
    pub token: CancelToken,
}

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();

        Self {
            status: 200,
            body: Bytes::from(body),
        }
    }

    /// Creates an error response with a JSON message body.
    pub fn error(status: u16, message: &str) -> Self {
        let error = serde_json::json!({ "message": message });
        Self::json(&error).with_status(status)
    }

    /// Creates a plain-text response.
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    /// Creates an empty response.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
        }
    }

    /// Creates a response with custom status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

/// How the mock answers one call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Settle with this response.
    Respond(MockResponse),
    /// Fail with this transport error.
    Fail(TransportError),
    /// Never settle; resolve as cancelled once the token fires.
    Pending,
}

/// Mock HTTP transport for testing.
pub struct MockTransport {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    requests: Mutex<Vec<RecordedRequest>>,
    default_response: Mutex<Option<MockResponse>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: Mutex::new(None),
        }
    }

    /// Queues an outcome.
    pub fn queue(&self, outcome: MockOutcome) {
        self.outcomes.lock().push_back(outcome);
    }

    /// Queues a JSON response.
    pub fn queue_json<T: serde::Serialize>(&self, value: &T) {
        self.queue(MockOutcome::Respond(MockResponse::json(value)));
    }

    /// Queues a transport failure.
    pub fn queue_failure(&self, error: TransportError) {
        self.queue(MockOutcome::Fail(error));
    }

    /// Sets the response used once the queue is empty.
    pub fn set_default(&self, response: MockResponse) {
        *self.default_response.lock() = Some(response);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns how many recorded calls had their cancel signal fired.
    pub fn cancelled_count(&self) -> usize {
        self.requests
            .lock()
            .iter()
            .map(|r| r.token.signal_count())
            .sum()
    }

    fn next_outcome(&self) -> MockOutcome {
        if let Some(outcome) = self.outcomes.lock().pop_front() {
            return outcome;
        }
        let response = self
            .default_response
            .lock()
            .clone()
            .unwrap_or_else(|| MockResponse::error(500, "No mock response configured"));
        MockOutcome::Respond(response)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(
        &self,
        request: HttpRequest,
        cancel: CancelToken,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(RecordedRequest {
            method: request.method,
            path: request.path,
            query: request.query,
            body: request.body,
            token: cancel.clone(),
        });

        match self.next_outcome() {
            MockOutcome::Respond(response) => Ok(HttpResponse {
                status: response.status,
                body: response.body,
            }),
            MockOutcome::Fail(error) => Err(error),
            MockOutcome::Pending => {
                cancel.cancelled().await;
                Err(TransportError::Cancelled)
            }
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .finish()
    }
}
