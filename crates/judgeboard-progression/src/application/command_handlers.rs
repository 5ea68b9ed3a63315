//! Command handlers for the Ordering & Progression context.
//!
//! The [`ProgressionController`] owns every write of a context's current
//! state: load the group's attempts, recompute the next competitor, and
//! persist the pointer with a compare-and-swap on its version.

use std::sync::Arc;

use judgeboard_core::clock::Clock;
use judgeboard_core::config::JudgingConfig;
use judgeboard_core::context::JudgingContext;
use judgeboard_core::deadline::within;
use judgeboard_core::error::DomainError;
use judgeboard_core::lock::{ContextGuard, ContextLocks};
use judgeboard_core::progression::CurrentState;
use judgeboard_core::store::{AttemptStore, CurrentStateStore};
use tracing::{debug, info};

use crate::domain::ordering::next_in_sequence;

/// Result of a committed advance.
#[derive(Debug, Clone)]
pub struct ProgressionOutcome {
    /// The pointer as written.
    pub state: CurrentState,
    /// Whether round, competitor or completion differ from the previous pointer.
    pub changed: bool,
}

/// Moves each context's current-competitor pointer.
pub struct ProgressionController {
    attempts: Arc<dyn AttemptStore>,
    states: Arc<dyn CurrentStateStore>,
    locks: Arc<ContextLocks>,
    clock: Arc<dyn Clock>,
    config: JudgingConfig,
}

impl ProgressionController {
    /// Creates a controller. `locks` must be the registry shared with every
    /// other component that mutates the same contexts.
    #[must_use]
    pub fn new(
        attempts: Arc<dyn AttemptStore>,
        states: Arc<dyn CurrentStateStore>,
        locks: Arc<ContextLocks>,
        clock: Arc<dyn Clock>,
        config: JudgingConfig,
    ) -> Self {
        Self {
            attempts,
            states,
            locks,
            clock,
            config,
        }
    }

    /// Waits for exclusive access to `context`.
    pub async fn lock(&self, context: JudgingContext) -> ContextGuard {
        self.locks.acquire(context).await
    }

    /// Advances the context held by `guard`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if loading or writing fails, times out, or the
    /// pointer was changed by another writer.
    pub async fn advance_locked(
        &self,
        guard: &ContextGuard,
    ) -> Result<ProgressionOutcome, DomainError> {
        let context = guard.context();
        let limit = self.config.store_timeout;

        let competitors = within(
            "load_competitor_attempts",
            limit,
            self.attempts.load_competitor_attempts(&context),
        )
        .await?;
        let previous = within(
            "load_current_state",
            limit,
            self.states.load_current_state(&context),
        )
        .await?
        .unwrap_or_else(|| CurrentState::initial(context));

        let next = next_in_sequence(&competitors, previous.round).to_state(
            context,
            previous.version + 1,
            self.clock.now(),
        );

        within(
            "save_current_state",
            limit,
            self.states.save_current_state(&next, previous.version),
        )
        .await?;

        let changed = next.round != previous.round
            || next.current_competitor_id != previous.current_competitor_id
            || next.completed != previous.completed;
        if changed {
            info!(
                %context,
                round = %next.round,
                current_competitor_id = ?next.current_competitor_id,
                completed = next.completed,
                version = next.version,
                "progression advanced"
            );
        } else {
            debug!(%context, version = next.version, "progression unchanged");
        }

        Ok(ProgressionOutcome {
            state: next,
            changed,
        })
    }
}
