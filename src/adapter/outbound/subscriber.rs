//! Bundled update subscribers.

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::Result;
use crate::port::{UpdateEvent, UpdateSubscriber};

/// A subscriber that logs each update via tracing.
pub struct LogSubscriber;

impl UpdateSubscriber for LogSubscriber {
    fn on_update(&self, event: &UpdateEvent) -> Result<()> {
        for kind in event.changed.kinds() {
            info!(
                mode = %event.mode,
                kind = %kind,
                count = event.changed.ids(kind).map_or(0, |ids| ids.len()),
                timestamp = %event.timestamp,
                "Cache updated"
            );
        }
        Ok(())
    }
}

/// Forwards updates into a tokio broadcast channel for async consumers.
///
/// Slow receivers lag and lose the oldest events; the channel never blocks
/// the sync cycle.
pub struct BroadcastSubscriber {
    sender: broadcast::Sender<UpdateEvent>,
}

impl BroadcastSubscriber {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Open a new receiver. It sees only events published after this call.
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<UpdateEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl UpdateSubscriber for BroadcastSubscriber {
    fn on_update(&self, event: &UpdateEvent) -> Result<()> {
        if self.sender.send(event.clone()).is_err() {
            debug!("No broadcast receivers, update dropped");
        }
        Ok(())
    }
}
