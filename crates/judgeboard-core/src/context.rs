//! Judging context: one independent (group, lift) judging queue.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one independent judging queue: a group of competitors
/// performing one lift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JudgingContext {
    /// The competitor group (flight) being judged.
    pub group_id: Uuid,
    /// The lift being performed.
    pub lift_id: Uuid,
}

impl JudgingContext {
    /// Creates a context key for the given group and lift.
    #[must_use]
    pub fn new(group_id: Uuid, lift_id: Uuid) -> Self {
        Self { group_id, lift_id }
    }

    /// Broadcast topic that carries every event of this context.
    #[must_use]
    pub fn topic(&self) -> String {
        format!("judging.{}.{}", self.group_id, self.lift_id)
    }
}

impl fmt::Display for JudgingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_id, self.lift_id)
    }
}
