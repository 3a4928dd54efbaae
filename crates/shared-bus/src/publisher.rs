//! # Correlation Bus
//!
//! Defines the publishing side of the bus and the subscriber table.
//!
//! ## Delivery Rules
//!
//! - `emit` delivers synchronously to every handler registered for the
//!   envelope's method, in registration order.
//! - No replay: handlers registered after an emit never see it.
//! - No subscribers is a silent no-op.
//! - Handlers may call `on`, `off` and `emit` re-entrantly. The table lock is
//!   released before any handler runs; a handler removed mid-emission is
//!   skipped, a handler added mid-emission waits for the next envelope.

use crate::correlation::CorrelationIdGenerator;
use crate::events::{BusMessage, EventFilter, Method};
use crate::subscriber::{EventStream, Subscription};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::entities::CorrelationId;
use signing_telemetry::BUS_MESSAGES_EMITTED;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A synchronous bus handler.
pub type Handler = Arc<dyn Fn(&BusMessage) + Send + Sync>;

/// Token returned by [`CorrelationBus::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Trait for publishing envelopes to the bus.
///
/// Components depend on this trait (injected) rather than on a global bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an envelope to the bus.
    ///
    /// # Returns
    ///
    /// The number of handlers that received the envelope.
    async fn publish(&self, message: BusMessage) -> usize;

    /// Get the total number of envelopes published.
    fn events_published(&self) -> u64;
}

struct Registration {
    id: HandlerId,
    handler: Handler,
}

/// In-process correlation bus.
///
/// Shared by reference (`Arc<CorrelationBus>`) between every component of a
/// signing coordinator; independent instances never see each other's
/// traffic, which keeps sessions testable in isolation.
pub struct CorrelationBus {
    /// Handlers by method, in registration order.
    handlers: RwLock<HashMap<Method, Vec<Registration>>>,

    /// Source of handler ids.
    next_handler: AtomicU64,

    /// Source of correlation ids for requests issued through this bus.
    ids: CorrelationIdGenerator,

    /// Total envelopes emitted.
    events_published: AtomicU64,
}

impl CorrelationBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            next_handler: AtomicU64::new(1),
            ids: CorrelationIdGenerator::new(),
            events_published: AtomicU64::new(0),
        }
    }

    /// Issue a correlation id distinct from every other id issued by this bus.
    pub fn next_correlation_id(&self) -> CorrelationId {
        self.ids.next_id()
    }

    /// Register a handler for `method`.
    pub fn on<F>(&self, method: Method, handler: F) -> HandlerId
    where
        F: Fn(&BusMessage) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_handler.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .entry(method)
            .or_default()
            .push(Registration {
                id,
                handler: Arc::new(handler),
            });

        debug!(method = method.as_str(), handler = id.0, "Handler registered");
        id
    }

    /// Unregister a handler. Returns false if it was not registered.
    pub fn off(&self, method: Method, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let Some(registrations) = handlers.get_mut(&method) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            handlers.remove(&method);
        }

        if removed {
            debug!(method = method.as_str(), handler = id.0, "Handler removed");
        }
        removed
    }

    /// Deliver an envelope to the current handlers of its method.
    ///
    /// # Returns
    ///
    /// The number of handlers invoked (0 when nobody listens).
    pub fn emit(&self, message: BusMessage) -> usize {
        let method = message.method();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let snapshot: Vec<(HandlerId, Handler)> = self
            .handlers
            .read()
            .get(&method)
            .map(|registrations| {
                registrations
                    .iter()
                    .map(|r| (r.id, r.handler.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut delivered = 0;
        for (id, handler) in snapshot {
            // An earlier handler in this emission may have removed this one.
            if !self.is_registered(method, id) {
                continue;
            }
            handler(&message);
            delivered += 1;
        }

        BUS_MESSAGES_EMITTED
            .with_label_values(&[method.as_str(), if delivered > 0 { "yes" } else { "no" }])
            .inc();
        debug!(
            method = method.as_str(),
            correlation_id = %message.id(),
            receivers = delivered,
            "Envelope emitted"
        );

        delivered
    }

    /// Subscribe to envelopes matching a filter.
    ///
    /// Returns a `Subscription` handle; dropping it unregisters.
    #[must_use]
    pub fn subscribe(self: &Arc<Self>, filter: EventFilter) -> Subscription {
        Subscription::register(self.clone(), filter)
    }

    /// Get a stream of envelopes matching a filter.
    #[must_use]
    pub fn event_stream(self: &Arc<Self>, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Number of handlers registered for `method`.
    #[must_use]
    pub fn subscriber_count(&self, method: Method) -> usize {
        self.handlers.read().get(&method).map_or(0, Vec::len)
    }

    /// Number of handlers registered across all methods.
    #[must_use]
    pub fn total_subscribers(&self) -> usize {
        self.handlers.read().values().map(Vec::len).sum()
    }

    fn is_registered(&self, method: Method, id: HandlerId) -> bool {
        self.handlers
            .read()
            .get(&method)
            .is_some_and(|registrations| registrations.iter().any(|r| r.id == id))
    }
}

impl Default for CorrelationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for CorrelationBus {
    async fn publish(&self, message: BusMessage) -> usize {
        self.emit(message)
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
