//! Fan-out of cache update events to subscribers.
//!
//! Delivery is synchronous, in registration order, and best-effort. Each
//! handler is isolated: an error or panic is logged and the next handler still
//! runs. There is no buffering; late subscribers never see earlier events.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::port::{UpdateEvent, UpdateSubscriber};

type Registry = RwLock<Vec<(u64, Arc<dyn UpdateSubscriber>)>>;

/// Delivery tally for one published event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

/// Registry of update subscribers (composite pattern).
pub struct UpdatePublisher {
    subscribers: Arc<Registry>,
    next_id: AtomicU64,
}

impl UpdatePublisher {
    /// Create a publisher with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a handler.
    ///
    /// The returned [`Subscription`] removes the handler when
    /// [`Subscription::unsubscribe`] is called. Dropping it keeps the handler
    /// registered.
    pub fn subscribe(&self, subscriber: Arc<dyn UpdateSubscriber>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push((id, subscriber));
        debug!(subscription = id, "Subscriber registered");
        Subscription {
            id,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    /// Deliver `event` to every registered handler.
    pub fn publish(&self, event: &UpdateEvent) -> PublishReport {
        // Snapshot the list so handlers may (un)subscribe during delivery.
        let subscribers: Vec<_> = self.subscribers.read().clone();

        let mut report = PublishReport::default();
        for (id, subscriber) in subscribers {
            match catch_unwind(AssertUnwindSafe(|| subscriber.on_update(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    warn!(subscription = id, mode = %event.mode, error = %e, "Subscriber failed");
                    report.failed += 1;
                }
                Err(_) => {
                    warn!(subscription = id, mode = %event.mode, "Subscriber panicked");
                    report.failed += 1;
                }
            }
        }

        debug!(
            mode = %event.mode,
            changed = event.changed.len(),
            delivered = report.delivered,
            failed = report.failed,
            "Published update"
        );
        report
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Check if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }
}

impl Default for UpdatePublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability to remove one handler from its publisher.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Remove the handler. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut subscribers = registry.write();
        let before = subscribers.len();
        subscribers.retain(|(id, _)| *id != self.id);
        before != subscribers.len()
    }
}
