//! Per-call cancellation handles.
//!
//! A [`CancellationHandle`] is the producing side owned by the stream; the
//! [`CancelToken`] it hands out is attached to the outgoing request so the
//! transport can abort it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Producer side of a cancellation pair. Signals at most once.
#[derive(Debug)]
pub struct CancellationHandle {
    token: CancellationToken,
    signals: Arc<AtomicUsize>,
}

impl CancellationHandle {
    /// Creates a fresh, unsignalled handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            signals: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns a consumer token bound to this handle.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            token: self.token.clone(),
            signals: Arc::clone(&self.signals),
        }
    }

    /// Signals cancellation.
    ///
    /// Returns `true` if this call fired the signal, `false` if it had
    /// already been fired.
    pub fn cancel(&self) -> bool {
        if self
            .signals
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Returns true once the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side of a cancellation pair, handed to the transport.
#[derive(Debug, Clone)]
pub struct CancelToken {
    token: CancellationToken,
    signals: Arc<AtomicUsize>,
}

impl CancelToken {
    /// Returns true once the producer has signalled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the producer signals.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Number of times the producer fired. Always 0 or 1.
    pub fn signal_count(&self) -> usize {
        self.signals.load(Ordering::Acquire)
    }
}
