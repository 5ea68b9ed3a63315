//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::JudgingContext;

/// Metadata attached to every published event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// The judging context the event belongs to.
    pub context: JudgingContext,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Creates metadata for a new event.
    #[must_use]
    pub fn new(context: JudgingContext, correlation_id: Uuid, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            context,
            correlation_id,
            occurred_at,
        }
    }

    /// Merges the metadata fields into an event body. Every payload carries
    /// `group_id`, `lift_id` and `timestamp`.
    #[must_use]
    pub fn stamp(&self, body: serde_json::Value) -> serde_json::Value {
        let mut payload = match body {
            serde_json::Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_owned(), other);
                map
            }
        };
        payload.insert("event_id".to_owned(), self.event_id.to_string().into());
        payload.insert(
            "group_id".to_owned(),
            self.context.group_id.to_string().into(),
        );
        payload.insert("lift_id".to_owned(), self.context.lift_id.to_string().into());
        payload.insert(
            "correlation_id".to_owned(),
            self.correlation_id.to_string().into(),
        );
        payload.insert(
            "timestamp".to_owned(),
            self.occurred_at.to_rfc3339().into(),
        );
        serde_json::Value::Object(payload)
    }
}

/// Trait that all published events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event name used on the broadcast channel.
    fn event_type(&self) -> &'static str;

    /// Serializes the full event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_stamp_adds_context_and_timestamp() {
        let context = JudgingContext::new(Uuid::new_v4(), Uuid::new_v4());
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let metadata = EventMetadata::new(context, Uuid::new_v4(), now);

        let payload = metadata.stamp(serde_json::json!({ "votes_received": 2 }));

        assert_eq!(payload["votes_received"], 2);
        assert_eq!(payload["group_id"], context.group_id.to_string());
        assert_eq!(payload["lift_id"], context.lift_id.to_string());
        assert_eq!(payload["timestamp"], now.to_rfc3339());
    }
}
