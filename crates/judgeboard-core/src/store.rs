//! Store capabilities consumed by the engine.

use async_trait::async_trait;
use uuid::Uuid;

use crate::attempt::{Attempt, AttemptStatus, CompetitorAttemptSet};
use crate::context::JudgingContext;
use crate::error::DomainError;
use crate::progression::CurrentState;

/// Durable attempt records.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Load every competitor of the context's group with their attempts for
    /// the context's lift. The order of the returned sets must be stable
    /// between calls.
    async fn load_competitor_attempts(
        &self,
        context: &JudgingContext,
    ) -> Result<Vec<CompetitorAttemptSet>, DomainError>;

    /// Load a single attempt, or `None` if it does not exist.
    async fn load_attempt(&self, attempt_id: Uuid) -> Result<Option<Attempt>, DomainError>;

    /// Set the status of one attempt, recording `override_reason` alongside.
    async fn update_attempt_status(
        &self,
        attempt_id: Uuid,
        status: AttemptStatus,
        override_reason: Option<String>,
    ) -> Result<(), DomainError>;
}

/// Durable per-context progression pointer.
#[async_trait]
pub trait CurrentStateStore: Send + Sync {
    /// Load the pointer for a context, or `None` if never written.
    async fn load_current_state(
        &self,
        context: &JudgingContext,
    ) -> Result<Option<CurrentState>, DomainError>;

    /// Write `state` if the stored version still equals `expected_version`
    /// (0 when the pointer has never been written). `state.version` carries
    /// the new version.
    ///
    /// Returns `DomainError::ConcurrencyConflict` when the stored version
    /// differs.
    async fn save_current_state(
        &self,
        state: &CurrentState,
        expected_version: i64,
    ) -> Result<(), DomainError>;
}
