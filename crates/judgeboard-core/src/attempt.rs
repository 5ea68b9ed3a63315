//! Attempts, rounds, and per-competitor attempt sets.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Attempt number within a lift (1, 2 or 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Round(u8);

impl Round {
    /// The opening attempt.
    pub const FIRST: Round = Round(1);
    /// The final attempt.
    pub const LAST: Round = Round(3);

    /// Creates a round, rejecting numbers outside `1..=3`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `number` is not 1, 2 or 3.
    pub fn new(number: u8) -> Result<Self, DomainError> {
        if (Self::FIRST.0..=Self::LAST.0).contains(&number) {
            Ok(Self(number))
        } else {
            Err(DomainError::Validation(format!(
                "round must be between 1 and 3, got {number}"
            )))
        }
    }

    /// The round number.
    #[must_use]
    pub fn number(self) -> u8 {
        self.0
    }

    /// The following round, or `None` after the final attempt.
    #[must_use]
    pub fn next(self) -> Option<Round> {
        if self < Self::LAST {
            Some(Round(self.0 + 1))
        } else {
            None
        }
    }

    /// Zero-based slot of this round in a competitor's attempt array.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Iterates this round and every later one.
    pub fn remaining(self) -> impl Iterator<Item = Round> {
        (self.0..=Self::LAST.0).map(Round)
    }
}

impl TryFrom<u8> for Round {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Round::new(value)
    }
}

impl From<Round> for u8 {
    fn from(round: Round) -> Self {
        round.0
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Judging status of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    /// Declared but not yet judged.
    Pending,
    /// Judged a good lift.
    Valid,
    /// Judged a no-lift.
    Invalid,
}

impl AttemptStatus {
    /// Whether a verdict has been recorded.
    #[must_use]
    pub fn is_judged(self) -> bool {
        self != AttemptStatus::Pending
    }

    /// Stable text form used by stores.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Pending => "PENDING",
            AttemptStatus::Valid => "VALID",
            AttemptStatus::Invalid => "INVALID",
        }
    }

    /// Parses the text form produced by [`AttemptStatus::as_str`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for unknown values.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "PENDING" => Ok(AttemptStatus::Pending),
            "VALID" => Ok(AttemptStatus::Valid),
            "INVALID" => Ok(AttemptStatus::Invalid),
            other => Err(DomainError::Validation(format!(
                "unknown attempt status: {other}"
            ))),
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared attempt as recorded by the attempt store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Attempt identifier.
    pub id: Uuid,
    /// The competitor performing the attempt.
    pub competitor_id: Uuid,
    /// Group of the competitor performing the attempt.
    pub group_id: Uuid,
    /// The lift this attempt belongs to.
    pub lift_id: Uuid,
    /// Attempt number within the lift.
    pub round: Round,
    /// Declared weight in kilograms.
    pub weight: Option<f64>,
    /// Judging status.
    pub status: AttemptStatus,
    /// Reason recorded when the status was set by an override or correction.
    pub override_reason: Option<String>,
}

/// One round slot inside a [`CompetitorAttemptSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptEntry {
    /// Attempt identifier.
    pub attempt_id: Uuid,
    /// Declared weight in kilograms.
    pub weight: Option<f64>,
    /// Judging status.
    pub status: AttemptStatus,
}

/// Derived view of one competitor's three attempts for a lift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorAttemptSet {
    /// Competitor identifier.
    pub competitor_id: Uuid,
    /// Display name.
    pub name: String,
    /// Bodyweight in kilograms, if weighed in.
    pub bodyweight: Option<f64>,
    /// Attempts indexed by `Round::index`; `None` when not declared.
    pub attempts: [Option<AttemptEntry>; 3],
}

impl CompetitorAttemptSet {
    /// Creates a set with no declared attempts.
    #[must_use]
    pub fn new(competitor_id: Uuid, name: impl Into<String>, bodyweight: Option<f64>) -> Self {
        Self {
            competitor_id,
            name: name.into(),
            bodyweight,
            attempts: [None, None, None],
        }
    }

    /// Places an attempt in its round slot, replacing any previous entry.
    #[must_use]
    pub fn with_attempt(mut self, round: Round, entry: AttemptEntry) -> Self {
        self.attempts[round.index()] = Some(entry);
        self
    }

    /// The attempt declared for `round`, if any.
    #[must_use]
    pub fn attempt(&self, round: Round) -> Option<&AttemptEntry> {
        self.attempts[round.index()].as_ref()
    }

    /// The declared weight for `round`, if any.
    #[must_use]
    pub fn weight(&self, round: Round) -> Option<f64> {
        self.attempt(round).and_then(|entry| entry.weight)
    }

    /// Whether the attempt for `round` carries a verdict.
    #[must_use]
    pub fn is_judged(&self, round: Round) -> bool {
        self.attempt(round)
            .is_some_and(|entry| entry.status.is_judged())
    }

    /// Whether the competitor still has to lift in `round`.
    #[must_use]
    pub fn awaits(&self, round: Round) -> bool {
        !self.is_judged(round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_rejects_out_of_range_numbers() {
        assert!(Round::new(0).is_err());
        assert!(Round::new(4).is_err());
        assert_eq!(Round::new(2).unwrap().number(), 2);
    }

    #[test]
    fn test_round_next_stops_after_last() {
        assert_eq!(Round::FIRST.next(), Some(Round::new(2).unwrap()));
        assert_eq!(Round::LAST.next(), None);
    }

    #[test]
    fn test_round_remaining_includes_self() {
        let rounds: Vec<u8> = Round::new(2).unwrap().remaining().map(Round::number).collect();
        assert_eq!(rounds, vec![2, 3]);
    }

    #[test]
    fn test_round_deserialize_validates_range() {
        assert!(serde_json::from_str::<Round>("3").is_ok());
        assert!(serde_json::from_str::<Round>("7").is_err());
    }

    #[test]
    fn test_status_round_trips_through_text_form() {
        for status in [
            AttemptStatus::Pending,
            AttemptStatus::Valid,
            AttemptStatus::Invalid,
        ] {
            assert_eq!(AttemptStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(AttemptStatus::parse("MAYBE").is_err());
    }

    #[test]
    fn test_missing_attempt_awaits_lift() {
        let set = CompetitorAttemptSet::new(Uuid::new_v4(), "A", Some(80.0));
        assert!(set.awaits(Round::FIRST));
        assert_eq!(set.weight(Round::FIRST), None);
    }
}
