//! Command handlers for the Vote Aggregation context.
//!
//! The [`VoteAggregator`] keeps at most one voting round per context. All
//! mutations of a context run under the context lock shared with the
//! [`ProgressionController`], so a quorum verdict, its status write and the
//! following advance are serialized against every other command for the
//! same context.
//!
//! A verdict that could not be written is parked and can be re-applied with
//! [`VoteAggregator::retry_pending_verdicts`] without new votes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use judgeboard_core::attempt::{Attempt, AttemptStatus};
use judgeboard_core::broadcast::{Broadcaster, publish_event};
use judgeboard_core::clock::Clock;
use judgeboard_core::command::Command;
use judgeboard_core::config::JudgingConfig;
use judgeboard_core::context::JudgingContext;
use judgeboard_core::deadline::within;
use judgeboard_core::error::DomainError;
use judgeboard_core::judge::{JudgePosition, QUORUM};
use judgeboard_core::lock::ContextGuard;
use judgeboard_core::store::AttemptStore;
use judgeboard_progression::application::command_handlers::{
    ProgressionController, ProgressionOutcome,
};
use judgeboard_progression::domain::commands::AdvanceProgression;
use judgeboard_progression::domain::events::ProgressionEvent;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::commands::{CorrectAttempt, ForceInvalid, RetryPendingVerdicts, SubmitVote};
use crate::domain::events::{FinalResult, JudgingEvent, JudgingEventKind, VerdictSource};
use crate::domain::round::{VoteTally, VotingRound, unanimous_tally};

/// Reason recorded when a director invalidates an attempt without one.
pub const DEFAULT_FORCE_INVALID_REASON: &str = "forced invalid";

/// Result of a submitted vote.
#[derive(Debug, Clone, Serialize)]
pub struct VoteResult {
    /// Always `true`; failures are returned as errors.
    pub success: bool,
    /// The attempt voted on.
    pub attempt_id: Uuid,
    /// Votes in the round after this one.
    pub votes_received: usize,
    /// Votes needed for a verdict.
    pub total_expected: usize,
    /// The verdict, once quorum is reached.
    pub final_result: Option<AttemptStatus>,
    /// Whether the progression pointer was written, once quorum is reached.
    pub advanced: Option<bool>,
    /// The competitor now due, once quorum is reached.
    pub next_competitor_id: Option<Uuid>,
}

impl VoteResult {
    /// A verdict set by the director, reported as a full round.
    fn overridden(attempt_id: Uuid, verdict: AttemptStatus, progress: &Progress) -> Self {
        Self {
            success: true,
            attempt_id,
            votes_received: QUORUM,
            total_expected: QUORUM,
            final_result: Some(verdict),
            advanced: Some(progress.advanced),
            next_competitor_id: progress.next_competitor_id,
        }
    }
}

/// Result of re-applying parked verdicts.
#[derive(Debug, Clone, Serialize)]
pub struct RetryResult {
    /// Attempts whose status was written by this retry, in computation order.
    pub persisted: Vec<Uuid>,
    /// Whether the progression pointer was written.
    pub advanced: bool,
    /// The competitor now due, when advanced.
    pub next_competitor_id: Option<Uuid>,
}

/// A computed verdict whose effects are not yet fully durable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingVerdict {
    /// The judged attempt.
    pub attempt_id: Uuid,
    /// The computed verdict.
    pub verdict: AttemptStatus,
    /// Reason to record with the status.
    pub override_reason: Option<String>,
    /// How the verdict was reached.
    pub source: VerdictSource,
    /// The status write succeeded; only the advance is outstanding.
    pub status_persisted: bool,
}

struct Progress {
    advanced: bool,
    next_competitor_id: Option<Uuid>,
}

impl Progress {
    fn from_outcome(outcome: Option<ProgressionOutcome>) -> Self {
        match outcome {
            Some(outcome) => Self {
                advanced: true,
                next_competitor_id: outcome.state.current_competitor_id,
            },
            None => Self {
                advanced: false,
                next_competitor_id: None,
            },
        }
    }
}

struct Recorded {
    votes_received: usize,
    tally: VoteTally,
    verdict: Option<AttemptStatus>,
}

struct OpenRound {
    round: VotingRound,
    expiry: CancellationToken,
}

struct Inner {
    rounds: Mutex<HashMap<JudgingContext, OpenRound>>,
    pending: Mutex<HashMap<JudgingContext, Vec<PendingVerdict>>>,
    progression: Arc<ProgressionController>,
    attempts: Arc<dyn AttemptStore>,
    broadcaster: Arc<dyn Broadcaster>,
    clock: Arc<dyn Clock>,
    config: JudgingConfig,
}

impl Inner {
    /// Timer path: drops the round if it is still the one the timer was
    /// armed for.
    async fn expire(&self, context: JudgingContext, round_id: Uuid) {
        let _guard = self.progression.lock(context).await;
        let mut rounds = self.rounds.lock().unwrap_or_else(PoisonError::into_inner);
        if rounds
            .get(&context)
            .is_some_and(|open| open.round.round_id() == round_id)
            && let Some(open) = rounds.remove(&context)
        {
            info!(
                %context,
                attempt_id = %open.round.attempt_id(),
                votes_received = open.round.votes_received(),
                "voting round expired without quorum"
            );
        }
    }
}

/// Collects judges' votes and turns them into verdicts.
#[derive(Clone)]
pub struct VoteAggregator {
    inner: Arc<Inner>,
}

impl VoteAggregator {
    /// Creates an aggregator. Context locks are taken from `progression`.
    #[must_use]
    pub fn new(
        progression: Arc<ProgressionController>,
        attempts: Arc<dyn AttemptStore>,
        broadcaster: Arc<dyn Broadcaster>,
        clock: Arc<dyn Clock>,
        config: JudgingConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                rounds: Mutex::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
                progression,
                attempts,
                broadcaster,
                clock,
                config,
            }),
        }
    }

    /// Handles `SubmitVote`.
    ///
    /// # Errors
    ///
    /// - `DomainError::AttemptNotFound` if the attempt does not exist.
    /// - `DomainError::Validation` if it belongs to another context or is
    ///   already judged.
    /// - `DomainError::VerdictPending` if a verdict for the attempt is
    ///   waiting for [`Self::retry_pending_verdicts`].
    /// - `DomainError::AlreadyVoted` if the position already voted.
    /// - `DomainError::VerdictNotPersisted` if quorum was reached but the
    ///   status write failed; the verdict is kept for retry.
    pub async fn submit_vote(&self, command: &SubmitVote) -> Result<VoteResult, DomainError> {
        let context = command.context;
        let guard = self.lock(command).await;

        let attempt = self.load_attempt(context, command.attempt_id).await?;
        if attempt.status.is_judged() {
            return Err(DomainError::Validation(format!(
                "attempt {} is already judged {}",
                attempt.id, attempt.status
            )));
        }
        if let Some(parked) = self
            .pending_verdicts(context)
            .into_iter()
            .find(|entry| entry.attempt_id == command.attempt_id)
        {
            return Err(DomainError::VerdictPending {
                attempt_id: parked.attempt_id,
                verdict: parked.verdict,
            });
        }

        let now = self.inner.clock.now();
        let recorded = self.record_vote(
            context,
            command.attempt_id,
            command.position,
            command.verdict,
        )?;
        debug!(
            %context,
            attempt_id = %command.attempt_id,
            position = %command.position,
            votes_received = recorded.votes_received,
            "vote recorded"
        );

        let partial = JudgingEvent::partial_vote(
            context,
            command.correlation_id,
            now,
            command.attempt_id,
            command.position,
            recorded.tally.clone(),
        );
        publish_event(
            self.inner.broadcaster.as_ref(),
            &partial,
            self.inner.config.broadcast_timeout,
        )
        .await;

        let mut result = VoteResult {
            success: true,
            attempt_id: command.attempt_id,
            votes_received: recorded.votes_received,
            total_expected: QUORUM,
            final_result: recorded.verdict,
            advanced: None,
            next_competitor_id: None,
        };

        if let Some(verdict) = recorded.verdict {
            info!(%context, attempt_id = %command.attempt_id, %verdict, "quorum reached");
            let progress = self
                .finalize(
                    &guard,
                    command.correlation_id,
                    recorded.tally,
                    PendingVerdict {
                        attempt_id: command.attempt_id,
                        verdict,
                        override_reason: None,
                        source: VerdictSource::Quorum,
                        status_persisted: false,
                    },
                )
                .await?;
            result.advanced = Some(progress.advanced);
            result.next_competitor_id = progress.next_competitor_id;
        }

        Ok(result)
    }

    /// Handles `ForceInvalid`: drops any open round and records INVALID
    /// without waiting for quorum.
    ///
    /// # Errors
    ///
    /// - `DomainError::AttemptNotFound` if the attempt does not exist.
    /// - `DomainError::Validation` if it belongs to another context.
    /// - `DomainError::VerdictNotPersisted` if the status write failed.
    pub async fn force_invalid(&self, command: &ForceInvalid) -> Result<VoteResult, DomainError> {
        let context = command.context;
        let guard = self.lock(command).await;
        self.load_attempt(context, command.attempt_id).await?;

        self.discard_round(context, |_| true);
        let reason = command
            .reason
            .clone()
            .unwrap_or_else(|| DEFAULT_FORCE_INVALID_REASON.to_owned());
        info!(%context, attempt_id = %command.attempt_id, %reason, "attempt forced invalid");

        let progress = self
            .finalize(
                &guard,
                command.correlation_id,
                unanimous_tally(false),
                PendingVerdict {
                    attempt_id: command.attempt_id,
                    verdict: AttemptStatus::Invalid,
                    override_reason: Some(reason),
                    source: VerdictSource::ForceInvalid,
                    status_persisted: false,
                },
            )
            .await?;

        Ok(VoteResult::overridden(
            command.attempt_id,
            AttemptStatus::Invalid,
            &progress,
        ))
    }

    /// Handles `CorrectAttempt`: overwrites a verdict. An open round is only
    /// dropped when it is bound to the corrected attempt.
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation` if the new status is PENDING or the
    ///   attempt belongs to another context.
    /// - `DomainError::AttemptNotFound` if the attempt does not exist.
    /// - `DomainError::VerdictNotPersisted` if the status write failed.
    pub async fn correct_attempt(
        &self,
        command: &CorrectAttempt,
    ) -> Result<VoteResult, DomainError> {
        if !command.status.is_judged() {
            return Err(DomainError::Validation(
                "a correction must set VALID or INVALID".to_owned(),
            ));
        }
        let context = command.context;
        let guard = self.lock(command).await;
        let attempt = self.load_attempt(context, command.attempt_id).await?;

        self.discard_round(context, |round| round.attempt_id() == command.attempt_id);
        info!(
            %context,
            attempt_id = %command.attempt_id,
            from = %attempt.status,
            to = %command.status,
            "attempt corrected"
        );

        let progress = self
            .finalize(
                &guard,
                command.correlation_id,
                unanimous_tally(command.status == AttemptStatus::Valid),
                PendingVerdict {
                    attempt_id: command.attempt_id,
                    verdict: command.status,
                    override_reason: command.reason.clone(),
                    source: VerdictSource::Correction,
                    status_persisted: false,
                },
            )
            .await?;

        Ok(VoteResult::overridden(command.attempt_id, command.status, &progress))
    }

    /// Handles `RetryPendingVerdicts`: writes every parked verdict in
    /// computation order, then advances.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::VerdictNotPersisted` for the first write that
    /// fails again; that verdict and every later one stay parked.
    pub async fn retry_pending_verdicts(
        &self,
        command: &RetryPendingVerdicts,
    ) -> Result<RetryResult, DomainError> {
        let context = command.context;
        let guard = self.lock(command).await;

        let mut parked = self.take_pending(context);
        if parked.is_empty() {
            debug!(%context, "no pending verdicts to retry");
            return Ok(RetryResult {
                persisted: Vec::new(),
                advanced: false,
                next_competitor_id: None,
            });
        }

        let mut persisted = Vec::new();
        for index in 0..parked.len() {
            if parked[index].status_persisted {
                continue;
            }
            if let Err(e) = self.write_status(&parked[index]).await {
                let entry = &parked[index];
                let error = DomainError::VerdictNotPersisted {
                    attempt_id: entry.attempt_id,
                    verdict: entry.verdict,
                    reason: e.to_string(),
                };
                warn!(%context, attempt_id = %entry.attempt_id, error = %e, "verdict retry failed");
                self.restore_pending(context, parked);
                return Err(error);
            }
            parked[index].status_persisted = true;
            persisted.push(parked[index].attempt_id);
        }
        info!(%context, persisted = persisted.len(), "pending verdicts written");

        let outcome = match self.advance(&guard, command.correlation_id).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(%context, error = %e, "advance after retry failed");
                self.restore_pending(context, parked);
                None
            }
        };
        let progress = Progress::from_outcome(outcome);

        Ok(RetryResult {
            persisted,
            advanced: progress.advanced,
            next_competitor_id: progress.next_competitor_id,
        })
    }

    /// Handles `AdvanceProgression` under the context lock, settling parked
    /// verdicts whose status is already written and publishing the pointer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` or an infrastructure error
    /// if the pointer could not be written.
    pub async fn advance_progression(
        &self,
        command: &AdvanceProgression,
    ) -> Result<ProgressionOutcome, DomainError> {
        let guard = self.lock(command).await;
        self.advance(&guard, command.correlation_id).await
    }

    /// The context's open round, unless it has outlived the vote timeout.
    /// Never mutates engine state.
    #[must_use]
    pub fn active_round(&self, context: JudgingContext) -> Option<VotingRound> {
        let now = self.inner.clock.now();
        let rounds = self.inner.rounds.lock().unwrap_or_else(PoisonError::into_inner);
        rounds
            .get(&context)
            .filter(|open| !open.round.is_expired(now, self.inner.config.vote_timeout))
            .map(|open| open.round.clone())
    }

    /// Verdicts computed for the context whose effects are not yet durable.
    #[must_use]
    pub fn pending_verdicts(&self, context: JudgingContext) -> Vec<PendingVerdict> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&context)
            .cloned()
            .unwrap_or_default()
    }

    async fn lock(&self, command: &impl Command) -> ContextGuard {
        debug!(
            command_type = command.command_type(),
            correlation_id = %command.correlation_id(),
            context = %command.context(),
            "acquiring context lock"
        );
        self.inner.progression.lock(command.context()).await
    }

    async fn load_attempt(
        &self,
        context: JudgingContext,
        attempt_id: Uuid,
    ) -> Result<Attempt, DomainError> {
        let attempt = within(
            "load_attempt",
            self.inner.config.store_timeout,
            self.inner.attempts.load_attempt(attempt_id),
        )
        .await?
        .ok_or(DomainError::AttemptNotFound(attempt_id))?;
        if attempt.lift_id != context.lift_id {
            return Err(DomainError::Validation(format!(
                "attempt {attempt_id} does not belong to lift {}",
                context.lift_id
            )));
        }
        if attempt.group_id != context.group_id {
            return Err(DomainError::Validation(format!(
                "attempt {attempt_id} does not belong to group {}",
                context.group_id
            )));
        }
        Ok(attempt)
    }

    /// Records one vote in the context's round, replacing a round bound to
    /// another attempt or past its timeout. A round that reaches quorum is
    /// removed before returning.
    fn record_vote(
        &self,
        context: JudgingContext,
        attempt_id: Uuid,
        position: JudgePosition,
        verdict: bool,
    ) -> Result<Recorded, DomainError> {
        let now = self.inner.clock.now();
        let timeout = self.inner.config.vote_timeout;
        let mut rounds = self.inner.rounds.lock().unwrap_or_else(PoisonError::into_inner);

        let stale = rounds.get(&context).and_then(|open| {
            if open.round.attempt_id() != attempt_id {
                Some("attempt switched")
            } else if open.round.is_expired(now, timeout) {
                Some("round expired")
            } else {
                None
            }
        });
        if let Some(reason) = stale
            && let Some(open) = rounds.remove(&context)
        {
            open.expiry.cancel();
            info!(
                %context,
                discarded_attempt_id = %open.round.attempt_id(),
                votes_discarded = open.round.votes_received(),
                reason,
                "voting round discarded"
            );
        }

        let open = rounds
            .entry(context)
            .or_insert_with(|| self.open_round(context, attempt_id));
        let votes_received = open.round.record(position, verdict)?;
        let recorded = Recorded {
            votes_received,
            tally: open.round.tally(),
            verdict: open.round.verdict(),
        };

        if recorded.verdict.is_some()
            && let Some(open) = rounds.remove(&context)
        {
            open.expiry.cancel();
        }
        Ok(recorded)
    }

    fn open_round(&self, context: JudgingContext, attempt_id: Uuid) -> OpenRound {
        let round = VotingRound::open(attempt_id, self.inner.clock.now());
        let expiry = CancellationToken::new();
        self.arm_expiry(context, round.round_id(), expiry.clone());
        debug!(%context, %attempt_id, round_id = %round.round_id(), "voting round opened");
        OpenRound { round, expiry }
    }

    fn arm_expiry(&self, context: JudgingContext, round_id: Uuid, expiry: CancellationToken) {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let timeout = self.inner.config.vote_timeout;
        tokio::spawn(async move {
            tokio::select! {
                () = expiry.cancelled() => {}
                () = tokio::time::sleep(timeout) => {
                    if let Some(inner) = inner.upgrade() {
                        inner.expire(context, round_id).await;
                    }
                }
            }
        });
    }

    fn discard_round(&self, context: JudgingContext, matches: impl Fn(&VotingRound) -> bool) {
        let mut rounds = self.inner.rounds.lock().unwrap_or_else(PoisonError::into_inner);
        if rounds.get(&context).is_some_and(|open| matches(&open.round))
            && let Some(open) = rounds.remove(&context)
        {
            open.expiry.cancel();
            info!(
                %context,
                discarded_attempt_id = %open.round.attempt_id(),
                votes_discarded = open.round.votes_received(),
                "voting round discarded by override"
            );
        }
    }

    /// Publishes the verdict, writes it and advances the context.
    async fn finalize(
        &self,
        guard: &ContextGuard,
        correlation_id: Uuid,
        votes: VoteTally,
        verdict: PendingVerdict,
    ) -> Result<Progress, DomainError> {
        let context = guard.context();
        let event = JudgingEvent::new(
            context,
            correlation_id,
            self.inner.clock.now(),
            JudgingEventKind::FinalResult(FinalResult {
                attempt_id: verdict.attempt_id,
                result: verdict.verdict,
                votes,
                source: verdict.source,
                reason: verdict.override_reason.clone(),
            }),
        );
        publish_event(
            self.inner.broadcaster.as_ref(),
            &event,
            self.inner.config.broadcast_timeout,
        )
        .await;

        self.persist_and_advance(guard, correlation_id, verdict).await
    }

    async fn persist_and_advance(
        &self,
        guard: &ContextGuard,
        correlation_id: Uuid,
        mut verdict: PendingVerdict,
    ) -> Result<Progress, DomainError> {
        let context = guard.context();
        self.supersede_pending(context, verdict.attempt_id);

        if let Err(e) = self.write_status(&verdict).await {
            warn!(
                %context,
                attempt_id = %verdict.attempt_id,
                verdict = %verdict.verdict,
                error = %e,
                "verdict not persisted; kept for retry"
            );
            let error = DomainError::VerdictNotPersisted {
                attempt_id: verdict.attempt_id,
                verdict: verdict.verdict,
                reason: e.to_string(),
            };
            self.park(context, verdict);
            return Err(error);
        }
        verdict.status_persisted = true;

        let outcome = match self.advance(guard, correlation_id).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(
                    %context,
                    attempt_id = %verdict.attempt_id,
                    error = %e,
                    "advance after verdict failed; kept for retry"
                );
                self.park(context, verdict);
                None
            }
        };
        Ok(Progress::from_outcome(outcome))
    }

    async fn write_status(&self, verdict: &PendingVerdict) -> Result<(), DomainError> {
        within(
            "update_attempt_status",
            self.inner.config.store_timeout,
            self.inner.attempts.update_attempt_status(
                verdict.attempt_id,
                verdict.verdict,
                verdict.override_reason.clone(),
            ),
        )
        .await
    }

    /// Advances the context and publishes the new pointer. A committed
    /// advance recomputes from the store, so it also settles every parked
    /// verdict whose status is already written.
    async fn advance(
        &self,
        guard: &ContextGuard,
        correlation_id: Uuid,
    ) -> Result<ProgressionOutcome, DomainError> {
        let outcome = self.inner.progression.advance_locked(guard).await?;
        self.settle_pending(guard.context());

        let event = ProgressionEvent::from_state(&outcome.state, correlation_id, self.inner.clock.now());
        publish_event(
            self.inner.broadcaster.as_ref(),
            &event,
            self.inner.config.broadcast_timeout,
        )
        .await;
        Ok(outcome)
    }

    fn park(&self, context: JudgingContext, verdict: PendingVerdict) {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(context)
            .or_default()
            .push(verdict);
    }

    fn supersede_pending(&self, context: JudgingContext, attempt_id: Uuid) {
        let mut pending = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parked) = pending.get_mut(&context) {
            parked.retain(|entry| entry.attempt_id != attempt_id);
            if parked.is_empty() {
                pending.remove(&context);
            }
        }
    }

    fn settle_pending(&self, context: JudgingContext) {
        let mut pending = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parked) = pending.get_mut(&context) {
            parked.retain(|entry| !entry.status_persisted);
            if parked.is_empty() {
                pending.remove(&context);
            }
        }
    }

    fn take_pending(&self, context: JudgingContext) -> Vec<PendingVerdict> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&context)
            .unwrap_or_default()
    }

    fn restore_pending(&self, context: JudgingContext, mut parked: Vec<PendingVerdict>) {
        let mut pending = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = pending.entry(context).or_default();
        parked.append(slot);
        *slot = parked;
    }
}
