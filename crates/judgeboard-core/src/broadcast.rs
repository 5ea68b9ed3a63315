//! Broadcast capability: fire-and-forget fan-out to viewers.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::event::DomainEvent;

/// Failure of a single publish. Never propagated out of the engine.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The transport rejected or dropped the message.
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport did not accept the message in time.
    #[error("publish timed out after {0:?}")]
    TimedOut(Duration),
}

/// Publishes events to every connected viewer.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Publish one event on `topic`.
    async fn publish(
        &self,
        topic: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError>;
}

/// Publishes a domain event on its context topic, bounded by `limit`.
/// Failures are logged and swallowed.
pub async fn publish_event(broadcaster: &dyn Broadcaster, event: &dyn DomainEvent, limit: Duration) {
    let context = event.metadata().context;
    let topic = context.topic();
    let event_type = event.event_type();
    let outcome = match tokio::time::timeout(
        limit,
        broadcaster.publish(&topic, event_type, event.to_payload()),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(BroadcastError::TimedOut(limit)),
    };

    match outcome {
        Ok(()) => debug!(%context, event_type, "event published"),
        Err(e) => warn!(%context, event_type, error = %e, "failed to publish event"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::context::JudgingContext;
    use crate::event::EventMetadata;

    #[derive(Debug)]
    struct Ping(EventMetadata);

    impl DomainEvent for Ping {
        fn event_type(&self) -> &'static str {
            "ping"
        }

        fn to_payload(&self) -> serde_json::Value {
            self.0.stamp(serde_json::json!({}))
        }

        fn metadata(&self) -> &EventMetadata {
            &self.0
        }
    }

    #[derive(Default)]
    struct Capture(Mutex<Vec<(String, String)>>);

    #[async_trait]
    impl Broadcaster for Capture {
        async fn publish(
            &self,
            topic: &str,
            event: &str,
            _payload: serde_json::Value,
        ) -> Result<(), BroadcastError> {
            self.0
                .lock()
                .unwrap()
                .push((topic.to_owned(), event.to_owned()));
            Ok(())
        }
    }

    struct Stalled;

    #[async_trait]
    impl Broadcaster for Stalled {
        async fn publish(
            &self,
            _topic: &str,
            _event: &str,
            _payload: serde_json::Value,
        ) -> Result<(), BroadcastError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn ping() -> (JudgingContext, Ping) {
        let context = JudgingContext::new(Uuid::new_v4(), Uuid::new_v4());
        (context, Ping(EventMetadata::new(context, Uuid::new_v4(), Utc::now())))
    }

    #[tokio::test]
    async fn test_publish_event_uses_context_topic() {
        let (context, event) = ping();
        let capture = Capture::default();

        publish_event(&capture, &event, Duration::from_secs(1)).await;

        let published = capture.0.lock().unwrap().clone();
        assert_eq!(published, vec![(context.topic(), "ping".to_owned())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_event_gives_up_on_stalled_transport() {
        let (_, event) = ping();

        // Returns instead of hanging; the failure is only logged.
        publish_event(&Stalled, &event, Duration::from_secs(2)).await;
    }
}
