//! Cold, single-value result streams.
//!
//! A [`ResultStream`] does nothing until it is first polled. That first poll
//! is the subscription: it allocates a [`CancellationHandle`] and starts the
//! transport call. The stream then yields exactly one item, `Ok(value)` or
//! `Err(error)`, and ends. Dropping it (or calling
//! [`ResultStream::cancel`]) while the call is in flight fires the cancel
//! signal; a cancelled stream yields nothing further.

use futures::future::BoxFuture;
use futures::stream::{FusedStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::cancellation::CancellationHandle;
use crate::errors::{GatewayError, GatewayResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Observable lifecycle of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Not yet subscribed; no request has been sent.
    Idle,
    /// Subscribed and waiting on the transport.
    InFlight,
    /// A value was yielded; the stream is complete.
    Succeeded,
    /// An error was yielded; the stream is torn down.
    Failed,
    /// Unsubscribed before settlement; nothing was yielded.
    Cancelled,
}

enum Phase {
    Idle,
    InFlight {
        response: BoxFuture<'static, Result<HttpResponse, TransportError>>,
        handle: CancellationHandle,
    },
    Finished(CallState),
}

/// Lazy stream yielding one decoded response body or one error.
///
/// Cloning produces an independent idle stream for the same request, so each
/// clone issues its own call when polled.
#[must_use = "streams do nothing unless polled"]
pub struct ResultStream<T> {
    transport: Arc<dyn HttpTransport>,
    request: HttpRequest,
    phase: Phase,
    _output: PhantomData<fn() -> T>,
}

impl<T> ResultStream<T> {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>, request: HttpRequest) -> Self {
        Self {
            transport,
            request,
            phase: Phase::Idle,
            _output: PhantomData,
        }
    }

    /// Returns the request this stream issues when subscribed.
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> CallState {
        match &self.phase {
            Phase::Idle => CallState::Idle,
            Phase::InFlight { .. } => CallState::InFlight,
            Phase::Finished(state) => *state,
        }
    }

    /// Unsubscribes.
    ///
    /// While in flight this fires the cancel signal and drops the pending
    /// call. Before subscription it only prevents the request from ever being
    /// sent. After settlement it does nothing.
    pub fn cancel(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Finished(CallState::Cancelled)) {
            Phase::InFlight { handle, .. } => {
                if handle.cancel() {
                    tracing::debug!(
                        method = %self.request.method,
                        path = %self.request.path,
                        "Call cancelled in flight"
                    );
                }
            }
            Phase::Idle => {}
            settled @ Phase::Finished(_) => self.phase = settled,
        }
    }
}

impl<T: DeserializeOwned> ResultStream<T> {
    /// Subscribes and waits for the single outcome.
    ///
    /// Returns `None` only if the transport reported the call as cancelled.
    pub async fn single(mut self) -> Option<GatewayResult<T>> {
        self.next().await
    }

    fn subscribe(&mut self) {
        tracing::trace!(
            method = %self.request.method,
            path = %self.request.path,
            "Subscribed; sending request"
        );

        let handle = CancellationHandle::new();
        let token = handle.token();
        let transport = Arc::clone(&self.transport);
        let request = self.request.clone();

        self.phase = Phase::InFlight {
            response: Box::pin(async move { transport.send(request, token).await }),
            handle,
        };
    }
}

fn settle<T: DeserializeOwned>(response: HttpResponse) -> GatewayResult<T> {
    if !response.is_success() {
        return Err(GatewayError::Status {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        });
    }
    Ok(response.json()?)
}

impl<T: DeserializeOwned> Stream for ResultStream<T> {
    type Item = GatewayResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if matches!(this.phase, Phase::Idle) {
            this.subscribe();
        }

        let Phase::InFlight { response, .. } = &mut this.phase else {
            return Poll::Ready(None);
        };

        let outcome = match response.as_mut().poll(cx) {
            Poll::Ready(outcome) => outcome,
            Poll::Pending => return Poll::Pending,
        };

        let item = match outcome {
            Ok(response) => {
                tracing::debug!(
                    method = %this.request.method,
                    path = %this.request.path,
                    status = response.status,
                    "Call settled"
                );
                settle(response)
            }
            Err(TransportError::Cancelled) => {
                this.phase = Phase::Finished(CallState::Cancelled);
                return Poll::Ready(None);
            }
            Err(e) => {
                tracing::debug!(
                    method = %this.request.method,
                    path = %this.request.path,
                    error = %e,
                    "Call failed"
                );
                Err(GatewayError::from(e))
            }
        };

        this.phase = Phase::Finished(if item.is_ok() {
            CallState::Succeeded
        } else {
            CallState::Failed
        });
        Poll::Ready(Some(item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.phase {
            Phase::Finished(_) => (0, Some(0)),
            _ => (0, Some(1)),
        }
    }
}

impl<T: DeserializeOwned> FusedStream for ResultStream<T> {
    fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }
}

impl<T> Clone for ResultStream<T> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.transport), self.request.clone())
    }
}

impl<T> Drop for ResultStream<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T> fmt::Debug for ResultStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultStream")
            .field("request", &self.request)
            .field("state", &self.state())
            .finish()
    }
}
