//! Commands for the Ordering & Progression context.

use judgeboard_core::command::Command;
use judgeboard_core::context::JudgingContext;
use uuid::Uuid;

/// Command to recompute and persist a context's current competitor.
#[derive(Debug, Clone)]
pub struct AdvanceProgression {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The context to advance.
    pub context: JudgingContext,
}

impl Command for AdvanceProgression {
    fn command_type(&self) -> &'static str {
        "progression.advance"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn context(&self) -> JudgingContext {
        self.context
    }
}
