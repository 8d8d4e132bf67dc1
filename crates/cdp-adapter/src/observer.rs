//! Console and page-error observation, registered once per session.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservedKind {
    ConsoleError,
    PageError,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedEvent {
    pub kind: ObservedKind,
    pub message: String,
}

pub trait PageObserver: Send + Sync {
    fn on_event(&self, event: ObservedEvent);
}

/// Buffers everything it sees until drained.
#[derive(Clone, Default)]
pub struct CollectingObserver {
    events: Arc<Mutex<Vec<ObservedEvent>>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<ObservedEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageObserver for CollectingObserver {
    fn on_event(&self, event: ObservedEvent) {
        tracing::debug!(kind = ?event.kind, message = %event.message, "page event observed");
        self.events.lock().push(event);
    }
}
