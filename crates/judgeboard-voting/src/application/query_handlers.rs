//! Query handlers for the Vote Aggregation context.

use judgeboard_core::context::JudgingContext;
use judgeboard_core::judge::{JudgePosition, QUORUM};
use serde::Serialize;
use uuid::Uuid;

use super::command_handlers::VoteAggregator;

/// Snapshot of a context's voting round for reconnecting clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteStatusView {
    /// Whether a round is open.
    pub has_votes: bool,
    /// Votes recorded in the open round.
    pub votes_received: usize,
    /// Votes needed for a verdict.
    pub total_expected: usize,
    /// Seats that have voted, in seat order.
    pub judge_positions: Vec<JudgePosition>,
    /// The attempt the open round is bound to.
    pub attempt_id: Option<Uuid>,
    /// Computed verdicts not yet fully written.
    pub pending_verdicts: usize,
}

/// Reports the context's voting round without changing it.
#[must_use]
pub fn get_vote_status(aggregator: &VoteAggregator, context: JudgingContext) -> VoteStatusView {
    let pending_verdicts = aggregator.pending_verdicts(context).len();
    match aggregator.active_round(context) {
        Some(round) => VoteStatusView {
            has_votes: true,
            votes_received: round.votes_received(),
            total_expected: QUORUM,
            judge_positions: round.positions_voted(),
            attempt_id: Some(round.attempt_id()),
            pending_verdicts,
        },
        None => VoteStatusView {
            has_votes: false,
            votes_received: 0,
            total_expected: QUORUM,
            judge_positions: Vec::new(),
            attempt_id: None,
            pending_verdicts,
        },
    }
}
