//! Commands for the Vote Aggregation context.

use std::time::Duration;

use judgeboard_core::attempt::AttemptStatus;
use judgeboard_core::command::Command;
use judgeboard_core::context::JudgingContext;
use judgeboard_core::judge::JudgePosition;
use uuid::Uuid;

/// Command to record one judge's vote on the attempt in play.
#[derive(Debug, Clone)]
pub struct SubmitVote {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The context being judged.
    pub context: JudgingContext,
    /// The attempt the judge is voting on.
    pub attempt_id: Uuid,
    /// The judge's seat.
    pub position: JudgePosition,
    /// `true` for a good lift.
    pub verdict: bool,
}

impl Command for SubmitVote {
    fn command_type(&self) -> &'static str {
        "voting.submit_vote"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn context(&self) -> JudgingContext {
        self.context
    }
}

/// Command to finalize an attempt as INVALID without waiting for quorum.
#[derive(Debug, Clone)]
pub struct ForceInvalid {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The context being judged.
    pub context: JudgingContext,
    /// The attempt to invalidate.
    pub attempt_id: Uuid,
    /// Reason recorded on the attempt; a default is used when absent.
    pub reason: Option<String>,
}

impl Command for ForceInvalid {
    fn command_type(&self) -> &'static str {
        "voting.force_invalid"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn context(&self) -> JudgingContext {
        self.context
    }
}

/// Command to overwrite a recorded verdict.
#[derive(Debug, Clone)]
pub struct CorrectAttempt {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The context the attempt belongs to.
    pub context: JudgingContext,
    /// The attempt to correct.
    pub attempt_id: Uuid,
    /// The corrected verdict; must not be PENDING.
    pub status: AttemptStatus,
    /// Reason recorded on the attempt.
    pub reason: Option<String>,
}

impl Command for CorrectAttempt {
    fn command_type(&self) -> &'static str {
        "voting.correct_attempt"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn context(&self) -> JudgingContext {
        self.context
    }
}

/// Command to write verdicts that were computed but not persisted.
#[derive(Debug, Clone)]
pub struct RetryPendingVerdicts {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The context whose verdicts are retried.
    pub context: JudgingContext,
}

impl Command for RetryPendingVerdicts {
    fn command_type(&self) -> &'static str {
        "voting.retry_pending_verdicts"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn context(&self) -> JudgingContext {
        self.context
    }
}

/// What the director does with the attempt clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Start the countdown; `None` uses the configured default length.
    Start(Option<Duration>),
    /// Stop the countdown, keeping the remaining time in the event.
    Stop,
    /// Clear the countdown.
    Reset,
}

/// Command to drive a context's attempt clock.
#[derive(Debug, Clone)]
pub struct ControlTimer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The context whose clock is driven.
    pub context: JudgingContext,
    /// The clock action.
    pub action: TimerAction,
}

impl Command for ControlTimer {
    fn command_type(&self) -> &'static str {
        match self.action {
            TimerAction::Start(_) => "voting.start_timer",
            TimerAction::Stop => "voting.stop_timer",
            TimerAction::Reset => "voting.reset_timer",
        }
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn context(&self) -> JudgingContext {
        self.context
    }
}
