//! Shared fixtures for integration tests

#![allow(dead_code)]

use cod_relay::observe::{RelayEvent, RelayObserver};
use std::sync::{Arc, Mutex};

/// Observer that keeps every event it sees.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RelayEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<RelayEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RelayObserver for RecordingObserver {
    fn on_event(&self, event: &RelayEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
