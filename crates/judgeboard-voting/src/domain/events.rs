//! Domain events for the Vote Aggregation context.

use chrono::{DateTime, Utc};
use judgeboard_core::attempt::AttemptStatus;
use judgeboard_core::context::JudgingContext;
use judgeboard_core::event::{DomainEvent, EventMetadata};
use judgeboard_core::judge::{JudgePosition, QUORUM};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::round::VoteTally;

/// Event type identifier for [`PartialVote`].
pub const PARTIAL_VOTE_EVENT_TYPE: &str = "partial_vote";
/// Event type identifier for [`FinalResult`].
pub const FINAL_RESULT_EVENT_TYPE: &str = "final_result";
/// Event type identifier for [`TimerStarted`].
pub const TIMER_STARTED_EVENT_TYPE: &str = "timer_started";
/// Event type identifier for [`TimerStopped`].
pub const TIMER_STOPPED_EVENT_TYPE: &str = "timer_stopped";
/// Event type identifier for [`TimerReset`].
pub const TIMER_RESET_EVENT_TYPE: &str = "timer_reset";

/// How a final verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    /// All three judges voted.
    Quorum,
    /// The director invalidated the attempt.
    ForceInvalid,
    /// The director corrected a recorded verdict.
    Correction,
}

/// A judge voted and quorum may not yet be reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialVote {
    /// The attempt being judged.
    pub attempt_id: Uuid,
    /// The seat that just voted.
    pub judge_position: JudgePosition,
    /// Votes recorded so far.
    pub votes_received: usize,
    /// Votes needed for a verdict.
    pub total_expected: usize,
    /// Every position with its vote; unset positions are `null`.
    pub votes: VoteTally,
}

/// An attempt received its verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResult {
    /// The judged attempt.
    pub attempt_id: Uuid,
    /// VALID or INVALID.
    pub result: AttemptStatus,
    /// The votes behind the verdict.
    pub votes: VoteTally,
    /// How the verdict was reached.
    pub source: VerdictSource,
    /// Director's reason, for overrides.
    pub reason: Option<String>,
}

/// The attempt clock started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerStarted {
    /// Countdown length in seconds.
    pub duration_secs: u64,
}

/// The attempt clock stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerStopped {
    /// Seconds left when the clock stopped.
    pub remaining_secs: u64,
}

/// The attempt clock was cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerReset {}

/// Enumeration of all Vote Aggregation event kinds.
#[derive(Debug, Clone)]
pub enum JudgingEventKind {
    /// A judge voted.
    PartialVote(PartialVote),
    /// An attempt received its verdict.
    FinalResult(FinalResult),
    /// The attempt clock started.
    TimerStarted(TimerStarted),
    /// The attempt clock stopped.
    TimerStopped(TimerStopped),
    /// The attempt clock was cleared.
    TimerReset(TimerReset),
}

/// Domain event envelope for the Vote Aggregation context.
#[derive(Debug, Clone)]
pub struct JudgingEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// The specific event kind.
    pub kind: JudgingEventKind,
}

impl JudgingEvent {
    /// Wraps `kind` with fresh metadata.
    #[must_use]
    pub fn new(
        context: JudgingContext,
        correlation_id: Uuid,
        occurred_at: DateTime<Utc>,
        kind: JudgingEventKind,
    ) -> Self {
        Self {
            metadata: EventMetadata::new(context, correlation_id, occurred_at),
            kind,
        }
    }

    /// A partial-vote event for the tally after `position` voted.
    #[must_use]
    pub fn partial_vote(
        context: JudgingContext,
        correlation_id: Uuid,
        occurred_at: DateTime<Utc>,
        attempt_id: Uuid,
        judge_position: JudgePosition,
        votes: VoteTally,
    ) -> Self {
        let votes_received = votes.values().flatten().count();
        Self::new(
            context,
            correlation_id,
            occurred_at,
            JudgingEventKind::PartialVote(PartialVote {
                attempt_id,
                judge_position,
                votes_received,
                total_expected: QUORUM,
                votes,
            }),
        )
    }
}

impl DomainEvent for JudgingEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            JudgingEventKind::PartialVote(_) => PARTIAL_VOTE_EVENT_TYPE,
            JudgingEventKind::FinalResult(_) => FINAL_RESULT_EVENT_TYPE,
            JudgingEventKind::TimerStarted(_) => TIMER_STARTED_EVENT_TYPE,
            JudgingEventKind::TimerStopped(_) => TIMER_STOPPED_EVENT_TYPE,
            JudgingEventKind::TimerReset(_) => TIMER_RESET_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        let body = match &self.kind {
            JudgingEventKind::PartialVote(e) => serde_json::to_value(e),
            JudgingEventKind::FinalResult(e) => serde_json::to_value(e),
            JudgingEventKind::TimerStarted(e) => serde_json::to_value(e),
            JudgingEventKind::TimerStopped(e) => serde_json::to_value(e),
            JudgingEventKind::TimerReset(e) => serde_json::to_value(e),
        }
        .expect("JudgingEventKind serialization is infallible");
        self.metadata.stamp(body)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::round::unanimous_tally;

    fn context() -> JudgingContext {
        JudgingContext::new(Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_partial_vote_payload_counts_votes_and_keeps_unset_positions() {
        // Arrange
        let attempt_id = Uuid::new_v4();
        let mut votes = VoteTally::new();
        votes.insert(JudgePosition::Head, Some(true));
        votes.insert(JudgePosition::Left, None);
        votes.insert(JudgePosition::Right, Some(false));

        // Act
        let event = JudgingEvent::partial_vote(
            context(),
            Uuid::new_v4(),
            Utc::now(),
            attempt_id,
            JudgePosition::Right,
            votes,
        );
        let payload = event.to_payload();

        // Assert
        assert_eq!(event.event_type(), "partial_vote");
        assert_eq!(payload["attempt_id"], attempt_id.to_string());
        assert_eq!(payload["judge_position"], "RIGHT");
        assert_eq!(payload["votes_received"], 2);
        assert_eq!(payload["total_expected"], 3);
        assert!(payload["votes"]["LEFT"].is_null());
        assert_eq!(payload["votes"]["HEAD"], true);
    }

    #[test]
    fn test_final_result_payload_names_source() {
        let ctx = context();
        let event = JudgingEvent::new(
            ctx,
            Uuid::new_v4(),
            Utc::now(),
            JudgingEventKind::FinalResult(FinalResult {
                attempt_id: Uuid::new_v4(),
                result: AttemptStatus::Invalid,
                votes: unanimous_tally(false),
                source: VerdictSource::ForceInvalid,
                reason: Some("forced invalid".to_owned()),
            }),
        );

        let payload = event.to_payload();

        assert_eq!(event.event_type(), "final_result");
        assert_eq!(payload["result"], "INVALID");
        assert_eq!(payload["source"], "force_invalid");
        assert_eq!(payload["reason"], "forced invalid");
        assert_eq!(payload["group_id"], ctx.group_id.to_string());
    }

    #[test]
    fn test_timer_stopped_payload_reports_remaining_seconds() {
        let event = JudgingEvent::new(
            context(),
            Uuid::new_v4(),
            Utc::now(),
            JudgingEventKind::TimerStopped(TimerStopped { remaining_secs: 17 }),
        );

        assert_eq!(event.event_type(), "timer_stopped");
        assert_eq!(event.to_payload()["remaining_secs"], 17);
    }
}
