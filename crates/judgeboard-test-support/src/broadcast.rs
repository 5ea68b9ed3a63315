//! Test broadcasters: mock `Broadcaster` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use judgeboard_core::broadcast::{BroadcastError, Broadcaster};

/// One captured publish call.
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    /// Topic the event was published on.
    pub topic: String,
    /// Event name.
    pub event: String,
    /// Event payload.
    pub payload: serde_json::Value,
}

/// A broadcaster that records every publish call and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    published: Mutex<Vec<PublishedEvent>>,
}

impl RecordingBroadcaster {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every published event, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.published.lock().unwrap().clone()
    }

    /// Returns the payloads of every event named `event`, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn payloads_of(&self, event: &str) -> Vec<serde_json::Value> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.event == event)
            .map(|p| p.payload.clone())
            .collect()
    }

    /// Returns the event names in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn event_names(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.event.clone())
            .collect()
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn publish(
        &self,
        topic: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        self.published.lock().unwrap().push(PublishedEvent {
            topic: topic.to_owned(),
            event: event.to_owned(),
            payload,
        });
        Ok(())
    }
}

/// A broadcaster whose transport is always down.
#[derive(Debug)]
pub struct FailingBroadcaster;

#[async_trait]
impl Broadcaster for FailingBroadcaster {
    async fn publish(
        &self,
        _topic: &str,
        _event: &str,
        _payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        Err(BroadcastError::Transport("broker unreachable".into()))
    }
}
