//! In-process broadcast bus.
//!
//! Every published event is fanned out to all current subscribers. Having
//! no subscriber is not an error.

use async_trait::async_trait;
use judgeboard_core::broadcast::{BroadcastError, Broadcaster};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of messages a slow subscriber may lag behind.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// One event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusMessage {
    /// `judging.{group_id}.{lift_id}`.
    pub topic: String,
    /// Event name.
    pub event: String,
    /// Event payload.
    pub payload: serde_json::Value,
}

/// Fan-out of judging events to in-process subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusMessage>,
}

impl EventBus {
    /// Creates a bus that buffers up to `capacity` messages per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receives every message published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_BUS_CAPACITY)
    }
}

#[async_trait]
impl Broadcaster for EventBus {
    async fn publish(
        &self,
        topic: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        let message = BusMessage {
            topic: topic.to_owned(),
            event: event.to_owned(),
            payload,
        };
        match self.sender.send(message) {
            Ok(receivers) => debug!(topic, event, receivers, "event delivered"),
            Err(_) => debug!(topic, event, "no subscribers"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        // Arrange
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        // Act
        bus.publish("judging.g.l", "partial_vote", serde_json::json!({ "votes_received": 1 }))
            .await
            .unwrap();

        // Assert
        for receiver in [&mut first, &mut second] {
            let message = receiver.recv().await.unwrap();
            assert_eq!(message.topic, "judging.g.l");
            assert_eq!(message.event, "partial_vote");
            assert_eq!(message.payload["votes_received"], 1);
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let bus = EventBus::new(4);

        let result = bus.publish("judging.g.l", "timer_reset", serde_json::json!({})).await;

        assert!(result.is_ok());
    }
}
