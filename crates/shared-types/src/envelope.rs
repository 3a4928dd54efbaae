//! # Session Context
//!
//! Every request is threaded through its async steps with a
//! [`SessionContext`]: the correlation id it is currently waiting on and the
//! cancel signal shared by every step of the same logical request.
//!
//! ## Properties
//!
//! - **Explicit correlation**: stale-response filtering compares against
//!   `ctx.correlation_id()`, never against captured mutable state.
//! - **Sticky cancellation**: once cancelled, a token stays cancelled, and
//!   every step awaiting [`CancelToken::cancelled`] wakes.

use crate::entities::CorrelationId;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared, sticky cancel signal.
///
/// Clones observe the same signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Cancel every step observing this token. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-request context threaded through every async step.
#[derive(Debug, Clone)]
pub struct SessionContext {
    correlation_id: CorrelationId,
    cancel: CancelToken,
}

impl SessionContext {
    /// Start a new logical request.
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            cancel: CancelToken::new(),
        }
    }

    /// Attach an existing cancel signal (e.g. one owned by a UI modal).
    #[must_use]
    pub fn with_cancel(correlation_id: CorrelationId, cancel: CancelToken) -> Self {
        Self {
            correlation_id,
            cancel,
        }
    }

    /// A follow-up step of the same request under a fresh id.
    ///
    /// Shares the cancel signal, so cancelling either cancels both.
    #[must_use]
    pub fn next_step(&self, correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            cancel: self.cancel.clone(),
        }
    }

    /// The id this step is waiting on.
    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// The shared cancel signal.
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Cancel the whole logical request.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true if the request was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolve once the request is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}
