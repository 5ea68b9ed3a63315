//! Domain events for the Ordering & Progression context.

use chrono::{DateTime, Utc};
use judgeboard_core::attempt::Round;
use judgeboard_core::event::{DomainEvent, EventMetadata};
use judgeboard_core::progression::CurrentState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted after a context's pointer has been durably written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionAdvanced {
    /// Round now being lifted.
    pub round: Round,
    /// Competitor now due, if any.
    pub current_competitor_id: Option<Uuid>,
    /// Whether the context has finished.
    pub completed: bool,
    /// Version of the written pointer.
    pub version: i64,
}

/// Event type identifier for [`ProgressionAdvanced`].
pub const PROGRESSION_ADVANCED_EVENT_TYPE: &str = "progression_advanced";

/// Domain event envelope for the Ordering & Progression context.
#[derive(Debug, Clone)]
pub struct ProgressionEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub advanced: ProgressionAdvanced,
}

impl ProgressionEvent {
    /// Describes a freshly written pointer.
    #[must_use]
    pub fn from_state(state: &CurrentState, correlation_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            metadata: EventMetadata::new(state.context, correlation_id, now),
            advanced: ProgressionAdvanced {
                round: state.round,
                current_competitor_id: state.current_competitor_id,
                completed: state.completed,
                version: state.version,
            },
        }
    }
}

impl DomainEvent for ProgressionEvent {
    fn event_type(&self) -> &'static str {
        PROGRESSION_ADVANCED_EVENT_TYPE
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        let body = serde_json::to_value(&self.advanced)
            .expect("ProgressionAdvanced serialization is infallible");
        self.metadata.stamp(body)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
