//! # Subscriptions
//!
//! Async receiving side of the bus. A [`Subscription`] registers one
//! synchronous handler per routed method that forwards matching envelopes
//! into an unbounded channel; dropping the subscription unregisters them.

use crate::events::{BusMessage, EventFilter, Method};
use crate::publisher::{CorrelationBus, HandlerId};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The subscription was closed.
    #[error("Subscription closed")]
    Closed,
}

/// A subscription handle for receiving envelopes.
///
/// When dropped, the subscription is automatically cleaned up.
pub struct Subscription {
    /// The channel fed by the bus handlers.
    receiver: mpsc::UnboundedReceiver<BusMessage>,

    /// Filter for this subscription.
    filter: EventFilter,

    /// Bus to unregister from on drop.
    bus: Arc<CorrelationBus>,

    /// Registered handlers, one per routed method.
    handlers: Vec<(Method, HandlerId)>,
}

impl Subscription {
    /// Register forwarding handlers on `bus`.
    pub(crate) fn register(bus: Arc<CorrelationBus>, filter: EventFilter) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        let handlers = filter
            .routed_methods()
            .into_iter()
            .map(|method| {
                let sender = sender.clone();
                let filter = filter.clone();
                let id = bus.on(method, move |message| {
                    if filter.matches(message) {
                        // Receiver gone means the subscription is being dropped.
                        let _ = sender.send(message.clone());
                    }
                });
                (method, id)
            })
            .collect();

        debug!(methods = ?filter.methods, correlation_id = ?filter.correlation_id, "New subscription created");

        Self {
            receiver,
            filter,
            bus,
            handlers,
        }
    }

    /// Receive the next matching envelope.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next matching envelope
    /// - `None` - The subscription was closed
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.receiver.recv().await
    }

    /// Try to receive the next envelope without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` - An envelope was available
    /// - `Ok(None)` - Nothing available yet
    /// - `Err(SubscriptionError::Closed)` - The subscription was closed
    pub fn try_recv(&mut self) -> Result<Option<BusMessage>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<BusMessage>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for (method, id) in self.handlers.drain(..) {
            self.bus.off(method, id);
        }
        debug!(methods = ?self.filter.methods, "Subscription dropped");
    }
}

/// A stream wrapper for subscriptions.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
pub struct EventStream {
    subscription: Subscription,
}

impl EventStream {
    /// Create a new event stream from a subscription.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        self.subscription.filter()
    }
}

impl Stream for EventStream {
    type Item = BusMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.subscription.poll_recv(cx)
    }
}
