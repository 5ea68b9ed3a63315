//! Query handlers for the Ordering & Progression context.
//!
//! Read-only views for reconnecting clients and lifting-order boards.

use std::time::Duration;

use judgeboard_core::attempt::{AttemptStatus, Round};
use judgeboard_core::context::JudgingContext;
use judgeboard_core::deadline::within;
use judgeboard_core::error::DomainError;
use judgeboard_core::progression::CurrentState;
use judgeboard_core::store::{AttemptStore, CurrentStateStore};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::ordering::reorder;

/// One row of the lifting-order board.
#[derive(Debug, Clone, Serialize)]
pub struct LiftingOrderEntry {
    /// Competitor identifier.
    pub competitor_id: Uuid,
    /// Display name.
    pub name: String,
    /// Bodyweight in kilograms.
    pub bodyweight: Option<f64>,
    /// The attempt for the board's round, if declared.
    pub attempt_id: Option<Uuid>,
    /// Declared weight for the board's round.
    pub weight: Option<f64>,
    /// Status of the board's round attempt; `None` when not declared.
    pub status: Option<AttemptStatus>,
    /// Declared weight for the following round.
    pub next_weight: Option<f64>,
    /// Whether this competitor is the context's current competitor.
    pub is_current: bool,
}

/// Lifting-order board for one round of a context.
#[derive(Debug, Clone, Serialize)]
pub struct LiftingOrderView {
    /// Round the board is ordered for.
    pub round: Round,
    /// The context's current competitor.
    pub current_competitor_id: Option<Uuid>,
    /// Whether the context has finished.
    pub completed: bool,
    /// Competitors in display order.
    pub entries: Vec<LiftingOrderEntry>,
}

/// Retrieves a context's pointer; a context that was never advanced reports
/// its initial state.
///
/// # Errors
///
/// Returns `DomainError` if the store fails or times out.
pub async fn get_current_state(
    context: JudgingContext,
    states: &dyn CurrentStateStore,
    limit: Duration,
) -> Result<CurrentState, DomainError> {
    let state = within("load_current_state", limit, states.load_current_state(&context)).await?;
    Ok(state.unwrap_or_else(|| CurrentState::initial(context)))
}

/// Builds the lifting-order board for `round`, defaulting to the context's
/// current round.
///
/// # Errors
///
/// Returns `DomainError` if either store fails or times out.
pub async fn get_lifting_order(
    context: JudgingContext,
    round: Option<Round>,
    attempts: &dyn AttemptStore,
    states: &dyn CurrentStateStore,
    limit: Duration,
) -> Result<LiftingOrderView, DomainError> {
    let current = get_current_state(context, states, limit).await?;
    let competitors = within(
        "load_competitor_attempts",
        limit,
        attempts.load_competitor_attempts(&context),
    )
    .await?;
    let round = round.unwrap_or(current.round);

    let entries = reorder(&competitors, round)
        .into_iter()
        .map(|c| {
            let attempt = c.attempt(round);
            LiftingOrderEntry {
                competitor_id: c.competitor_id,
                name: c.name.clone(),
                bodyweight: c.bodyweight,
                attempt_id: attempt.map(|a| a.attempt_id),
                weight: attempt.and_then(|a| a.weight),
                status: attempt.map(|a| a.status),
                next_weight: round.next().and_then(|next| c.weight(next)),
                is_current: current.current_competitor_id == Some(c.competitor_id),
            }
        })
        .collect();

    Ok(LiftingOrderView {
        round,
        current_competitor_id: current.current_competitor_id,
        completed: current.completed,
        entries,
    })
}
