//! Shared application state.

use std::sync::Arc;

use judgeboard_core::broadcast::Broadcaster;
use judgeboard_core::clock::Clock;
use judgeboard_core::config::JudgingConfig;
use judgeboard_core::lock::ContextLocks;
use judgeboard_core::store::{AttemptStore, CurrentStateStore};
use judgeboard_progression::application::command_handlers::ProgressionController;
use judgeboard_voting::application::command_handlers::VoteAggregator;
use judgeboard_voting::application::timer_handlers::AttemptTimers;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Attempt records.
    pub attempt_store: Arc<dyn AttemptStore>,
    /// Progression pointers.
    pub state_store: Arc<dyn CurrentStateStore>,
    /// Collects votes and overrides, and advances contexts under their lock.
    pub aggregator: VoteAggregator,
    /// Attempt clocks.
    pub timers: Arc<AttemptTimers>,
    /// Engine tunables.
    pub config: JudgingConfig,
}

impl AppState {
    /// Wires the engine around the given capabilities. The aggregator and
    /// the progression controller share one lock registry.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        attempt_store: Arc<dyn AttemptStore>,
        state_store: Arc<dyn CurrentStateStore>,
        broadcaster: Arc<dyn Broadcaster>,
        config: JudgingConfig,
    ) -> Self {
        let progression = Arc::new(ProgressionController::new(
            attempt_store.clone(),
            state_store.clone(),
            Arc::new(ContextLocks::new()),
            clock.clone(),
            config,
        ));
        let aggregator = VoteAggregator::new(
            progression,
            attempt_store.clone(),
            broadcaster.clone(),
            clock.clone(),
            config,
        );
        let timers = Arc::new(AttemptTimers::new(
            broadcaster,
            clock,
            config,
        ));
        Self {
            attempt_store,
            state_store,
            aggregator,
            timers,
            config,
        }
    }
}
