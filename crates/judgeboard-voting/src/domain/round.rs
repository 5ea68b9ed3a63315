//! The voting round: votes cast on one attempt in one context.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use judgeboard_core::attempt::AttemptStatus;
use judgeboard_core::error::DomainError;
use judgeboard_core::judge::{JudgePosition, QUORUM};
use uuid::Uuid;

/// Every position with its vote; `None` until that judge has voted.
pub type VoteTally = BTreeMap<JudgePosition, Option<bool>>;

/// VALID iff at least two of the votes are good lifts.
#[must_use]
pub fn majority_verdict(votes: impl IntoIterator<Item = bool>) -> AttemptStatus {
    let good = votes.into_iter().filter(|&vote| vote).count();
    if good * 2 > QUORUM {
        AttemptStatus::Valid
    } else {
        AttemptStatus::Invalid
    }
}

/// A full tally where every position cast `verdict`, used for verdicts
/// that were not reached by voting.
#[must_use]
pub fn unanimous_tally(verdict: bool) -> VoteTally {
    JudgePosition::ALL
        .into_iter()
        .map(|position| (position, Some(verdict)))
        .collect()
}

/// Votes cast on one attempt. Lives until quorum, expiry, or replacement.
#[derive(Debug, Clone)]
pub struct VotingRound {
    round_id: Uuid,
    attempt_id: Uuid,
    votes: [Option<bool>; QUORUM],
    created_at: DateTime<Utc>,
}

impl VotingRound {
    /// Opens an empty round bound to `attempt_id`.
    #[must_use]
    pub fn open(attempt_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            round_id: Uuid::new_v4(),
            attempt_id,
            votes: [None; QUORUM],
            created_at,
        }
    }

    /// Identity of this round instance.
    #[must_use]
    pub fn round_id(&self) -> Uuid {
        self.round_id
    }

    /// The attempt being judged.
    #[must_use]
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    /// When the first vote arrived.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Records one judge's vote and returns the number of votes received.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyVoted` if `position` has already voted;
    /// the round is left unchanged.
    pub fn record(&mut self, position: JudgePosition, verdict: bool) -> Result<usize, DomainError> {
        let slot = &mut self.votes[position.index()];
        if slot.is_some() {
            return Err(DomainError::AlreadyVoted {
                attempt_id: self.attempt_id,
                position,
            });
        }
        *slot = Some(verdict);
        Ok(self.votes_received())
    }

    /// Number of positions that have voted.
    #[must_use]
    pub fn votes_received(&self) -> usize {
        self.votes.iter().flatten().count()
    }

    /// Positions that have voted, in seat order.
    #[must_use]
    pub fn positions_voted(&self) -> Vec<JudgePosition> {
        JudgePosition::ALL
            .into_iter()
            .filter(|position| self.votes[position.index()].is_some())
            .collect()
    }

    /// Every position with its vote so far.
    #[must_use]
    pub fn tally(&self) -> VoteTally {
        JudgePosition::ALL
            .into_iter()
            .map(|position| (position, self.votes[position.index()]))
            .collect()
    }

    /// The majority verdict once every position has voted.
    #[must_use]
    pub fn verdict(&self) -> Option<AttemptStatus> {
        let votes: Option<Vec<bool>> = self.votes.iter().copied().collect();
        votes.map(|votes| majority_verdict(votes))
    }

    /// Whether the round has outlived `timeout` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        (now - self.created_at)
            .to_std()
            .is_ok_and(|age| age >= timeout)
    }
}
