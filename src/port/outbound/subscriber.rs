//! Subscriber port for cache update notifications.
//!
//! Downstream consumers (strategy engines, dashboards) implement
//! [`UpdateSubscriber`] to learn which entities a sync cycle touched. They read
//! the entities themselves from the cache on demand.

use chrono::{DateTime, Utc};

use crate::domain::{ChangeSet, SyncMode};
use crate::error::Result;

/// Notification that a sync cycle changed the cache.
#[derive(Debug, Clone)]
pub struct UpdateEvent {
    /// Mode of the cycle that produced the change.
    pub mode: SyncMode,
    /// Ids received per kind. A snapshot reports every id it stored.
    pub changed: ChangeSet,
    /// When the change was merged.
    pub timestamp: DateTime<Utc>,
}

impl UpdateEvent {
    #[must_use]
    pub fn new(mode: SyncMode, changed: ChangeSet) -> Self {
        Self {
            mode,
            changed,
            timestamp: Utc::now(),
        }
    }
}

/// Trait for update handlers.
///
/// Delivery is synchronous and in registration order. A handler that returns
/// an error or panics is logged and skipped; other handlers still receive the
/// event.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `on_update` runs on the sync task and should return quickly; spawn a
///   task or forward to a channel for slow work
pub trait UpdateSubscriber: Send + Sync {
    /// Handle an update.
    fn on_update(&self, event: &UpdateEvent) -> Result<()>;
}

impl<F> UpdateSubscriber for F
where
    F: Fn(&UpdateEvent) -> Result<()> + Send + Sync,
{
    fn on_update(&self, event: &UpdateEvent) -> Result<()> {
        self(event)
    }
}
