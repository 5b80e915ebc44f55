use std::sync::Arc;

use parking_lot::Mutex;

use oddsync::error::Result;
use oddsync::port::{UpdateEvent, UpdateSubscriber};

/// Subscriber that keeps every event it receives.
#[derive(Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<UpdateEvent>>,
}

impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn last(&self) -> Option<UpdateEvent> {
        self.events.lock().last().cloned()
    }
}

impl UpdateSubscriber for RecordingSubscriber {
    fn on_update(&self, event: &UpdateEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
