//! Command abstractions.

use uuid::Uuid;

use crate::context::JudgingContext;

/// Trait that all engine commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// The judging context the command is serialized on.
    fn context(&self) -> JudgingContext;
}
