//! Per-context progression pointer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attempt::Round;
use crate::context::JudgingContext;

/// The "who lifts next" pointer of one judging context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentState {
    /// The context this pointer belongs to.
    pub context: JudgingContext,
    /// The round currently being lifted.
    pub round: Round,
    /// The competitor due on the platform; `None` once completed.
    pub current_competitor_id: Option<Uuid>,
    /// Whether every competitor has finished every round.
    pub completed: bool,
    /// Compare-and-swap version; 0 means never written.
    pub version: i64,
    /// Time of the last write.
    pub updated_at: Option<DateTime<Utc>>,
}

impl CurrentState {
    /// The state a context starts in before any pointer has been written.
    #[must_use]
    pub fn initial(context: JudgingContext) -> Self {
        Self {
            context,
            round: Round::FIRST,
            current_competitor_id: None,
            completed: false,
            version: 0,
            updated_at: None,
        }
    }
}
