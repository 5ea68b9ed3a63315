//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::attempt::AttemptStatus;
use crate::context::JudgingContext;
use crate::judge::JudgePosition;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or inconsistent input, rejected before touching engine state.
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced attempt does not exist.
    #[error("attempt not found: {0}")]
    AttemptNotFound(Uuid),

    /// The judge position has already voted in the active round.
    #[error("judge {position} already voted on attempt {attempt_id}")]
    AlreadyVoted {
        /// The attempt the active round is bound to.
        attempt_id: Uuid,
        /// The position that voted twice.
        position: JudgePosition,
    },

    /// Optimistic concurrency conflict on a context's current state.
    #[error("concurrency conflict on context {context}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The context that had the conflict.
        context: JudgingContext,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A verdict was computed but could not be written. It is kept by the
    /// engine and can be re-applied without new votes.
    #[error("verdict {verdict} for attempt {attempt_id} was not persisted: {reason}")]
    VerdictNotPersisted {
        /// The judged attempt.
        attempt_id: Uuid,
        /// The computed verdict.
        verdict: AttemptStatus,
        /// The underlying store failure.
        reason: String,
    },

    /// A verdict for the attempt is parked; new votes are refused until it
    /// is retried.
    #[error("verdict {verdict} for attempt {attempt_id} is awaiting retry")]
    VerdictPending {
        /// The judged attempt.
        attempt_id: Uuid,
        /// The parked verdict.
        verdict: AttemptStatus,
    },

    /// An external call exceeded its deadline.
    #[error("{operation} timed out after {after_ms} ms")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The deadline in milliseconds.
        after_ms: u64,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
