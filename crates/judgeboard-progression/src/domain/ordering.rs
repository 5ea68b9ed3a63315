//! Lifting order: pure competitor selection and display ordering.
//!
//! Lifters take the bar lightest first. Ties on weight go to the heavier
//! lifter, who must lift before a lighter competitor attempting the same
//! weight. An undeclared weight always sorts last.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use judgeboard_core::attempt::{CompetitorAttemptSet, Round};
use judgeboard_core::context::JudgingContext;
use judgeboard_core::progression::CurrentState;
use uuid::Uuid;

/// Where a context's progression stands after a recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progression {
    /// `competitor_id` is next on the platform in `round`.
    Active {
        /// Round being lifted.
        round: Round,
        /// Competitor due next.
        competitor_id: Uuid,
    },
    /// Every competitor has a verdict in every round.
    Completed,
}

impl Progression {
    /// Builds the pointer record for this progression.
    #[must_use]
    pub fn to_state(self, context: JudgingContext, version: i64, now: DateTime<Utc>) -> CurrentState {
        let (round, current_competitor_id, completed) = match self {
            Progression::Active {
                round,
                competitor_id,
            } => (round, Some(competitor_id), false),
            Progression::Completed => (Round::LAST, None, true),
        };
        CurrentState {
            context,
            round,
            current_competitor_id,
            completed,
            version,
            updated_at: Some(now),
        }
    }
}

/// Declared weights ascending, undeclared last.
fn compare_weight(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Bodyweights descending, unknown last.
fn compare_bodyweight(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_lifting(a: &CompetitorAttemptSet, b: &CompetitorAttemptSet, round: Round) -> Ordering {
    compare_weight(a.weight(round), b.weight(round))
        .then_with(|| compare_bodyweight(a.bodyweight, b.bodyweight))
}

/// Competitors still to lift in `round`, in lifting order. Full ties keep
/// their input order.
#[must_use]
pub fn pending_queue(competitors: &[CompetitorAttemptSet], round: Round) -> Vec<&CompetitorAttemptSet> {
    let mut queue: Vec<&CompetitorAttemptSet> =
        competitors.iter().filter(|c| c.awaits(round)).collect();
    queue.sort_by(|a, b| compare_lifting(a, b, round));
    queue
}

/// The competitor due on the platform in `round`, if any.
#[must_use]
pub fn select_current(competitors: &[CompetitorAttemptSet], round: Round) -> Option<&CompetitorAttemptSet> {
    pending_queue(competitors, round).into_iter().next()
}

/// Display comparator for a live lifting-order board.
///
/// Competitors already judged in `round` come first, ordered by their next
/// declared weight; when neither has declared one yet they compare equal so
/// a stable sort leaves them where they were. Competitors still to lift
/// follow in lifting order.
#[must_use]
pub fn compare_for_display(a: &CompetitorAttemptSet, b: &CompetitorAttemptSet, round: Round) -> Ordering {
    match (a.is_judged(round), b.is_judged(round)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => compare_lifting(a, b, round),
        (true, true) => {
            let Some(next) = round.next() else {
                return Ordering::Equal;
            };
            match (a.weight(next), b.weight(next)) {
                (None, None) => Ordering::Equal,
                (wa, wb) => compare_weight(wa, wb)
                    .then_with(|| compare_bodyweight(a.bodyweight, b.bodyweight)),
            }
        }
    }
}

/// Reorders a display list for `round` with [`compare_for_display`],
/// preserving the relative order of equal entries.
#[must_use]
pub fn reorder(competitors: &[CompetitorAttemptSet], round: Round) -> Vec<&CompetitorAttemptSet> {
    let mut order: Vec<&CompetitorAttemptSet> = competitors.iter().collect();
    order.sort_by(|a, b| compare_for_display(a, b, round));
    order
}

/// Finds the next competitor starting at `from`, moving to later rounds
/// when a round has nobody left to lift.
#[must_use]
pub fn next_in_sequence(competitors: &[CompetitorAttemptSet], from: Round) -> Progression {
    from.remaining()
        .find_map(|round| {
            select_current(competitors, round).map(|c| Progression::Active {
                round,
                competitor_id: c.competitor_id,
            })
        })
        .unwrap_or(Progression::Completed)
}

#[cfg(test)]
mod tests {
    use judgeboard_core::attempt::{AttemptEntry, AttemptStatus};

    use super::*;

    fn round(n: u8) -> Round {
        Round::new(n).unwrap()
    }

    fn lifter(name: &str, bodyweight: f64) -> CompetitorAttemptSet {
        CompetitorAttemptSet::new(Uuid::new_v4(), name, Some(bodyweight))
    }

    fn declared(weight: Option<f64>, status: AttemptStatus) -> AttemptEntry {
        AttemptEntry {
            attempt_id: Uuid::new_v4(),
            weight,
            status,
        }
    }

    fn names(order: &[&CompetitorAttemptSet]) -> Vec<String> {
        order.iter().map(|c| c.name.clone()).collect()
    }

    fn opening_flight() -> Vec<CompetitorAttemptSet> {
        vec![
            lifter("A", 75.0).with_attempt(round(1), declared(Some(100.0), AttemptStatus::Pending)),
            lifter("B", 70.0).with_attempt(round(1), declared(Some(95.0), AttemptStatus::Pending)),
            lifter("C", 80.0).with_attempt(round(1), declared(Some(100.0), AttemptStatus::Pending)),
            lifter("D", 90.0).with_attempt(round(1), declared(None, AttemptStatus::Pending)),
        ]
    }

    #[test]
    fn test_pending_queue_orders_by_weight_then_heavier_lifter() {
        // Arrange
        let flight = opening_flight();

        // Act
        let queue = pending_queue(&flight, Round::FIRST);

        // Assert
        assert_eq!(names(&queue), vec!["B", "C", "A", "D"]);
        assert_eq!(select_current(&flight, Round::FIRST).unwrap().name, "B");
    }

    #[test]
    fn test_pending_queue_skips_judged_competitors() {
        let mut flight = opening_flight();
        flight[1].attempts[0] = Some(declared(Some(95.0), AttemptStatus::Valid));

        let queue = pending_queue(&flight, Round::FIRST);

        assert_eq!(names(&queue), vec!["C", "A", "D"]);
    }

    #[test]
    fn test_mixed_flight_orders_each_round_by_its_own_weights() {
        // Arrange
        let flight = vec![
            lifter("Judged light", 70.0)
                .with_attempt(round(1), declared(Some(100.0), AttemptStatus::Valid))
                .with_attempt(round(2), declared(Some(130.0), AttemptStatus::Pending)),
            lifter("Waiting A", 75.0).with_attempt(round(1), declared(Some(105.0), AttemptStatus::Pending)),
            lifter("Judged heavy", 80.0)
                .with_attempt(round(1), declared(Some(110.0), AttemptStatus::Invalid))
                .with_attempt(round(2), declared(Some(110.0), AttemptStatus::Pending)),
            lifter("Waiting B", 90.0).with_attempt(round(1), declared(Some(102.5), AttemptStatus::Pending)),
        ];

        // Act
        let first_round = pending_queue(&flight, Round::FIRST);
        let second_round = pending_queue(&flight, round(2));

        // Assert
        assert_eq!(names(&first_round), vec!["Waiting B", "Waiting A"]);
        assert_eq!(select_current(&flight, Round::FIRST).unwrap().name, "Waiting B");
        assert_eq!(names(&second_round[..2]), vec!["Judged heavy", "Judged light"]);
        assert_eq!(select_current(&flight, round(2)).unwrap().name, "Judged heavy");
    }

    #[test]
    fn test_undeclared_attempt_still_awaits_lift() {
        let flight = vec![
            lifter("A", 75.0).with_attempt(round(1), declared(Some(100.0), AttemptStatus::Valid)),
            lifter("B", 70.0),
        ];

        assert_eq!(select_current(&flight, Round::FIRST).unwrap().name, "B");
    }

    #[test]
    fn test_missing_bodyweight_loses_weight_tie() {
        let flight = vec![
            CompetitorAttemptSet::new(Uuid::new_v4(), "Unweighed", None)
                .with_attempt(round(1), declared(Some(100.0), AttemptStatus::Pending)),
            lifter("Light", 60.0).with_attempt(round(1), declared(Some(100.0), AttemptStatus::Pending)),
        ];

        assert_eq!(names(&pending_queue(&flight, Round::FIRST)), vec!["Light", "Unweighed"]);
    }

    #[test]
    fn test_reorder_puts_judged_competitor_with_next_weight_first() {
        // Arrange
        let flight = vec![
            lifter("Waiting", 70.0)
                .with_attempt(round(1), declared(Some(90.0), AttemptStatus::Pending)),
            lifter("Done", 80.0)
                .with_attempt(round(1), declared(Some(100.0), AttemptStatus::Valid))
                .with_attempt(round(2), declared(Some(110.0), AttemptStatus::Pending)),
        ];

        // Act
        let order = reorder(&flight, Round::FIRST);

        // Assert
        assert_eq!(names(&order), vec!["Done", "Waiting"]);
    }

    #[test]
    fn test_reorder_keeps_judged_order_until_next_weights_are_declared() {
        let flight = vec![
            lifter("First", 70.0).with_attempt(round(1), declared(Some(120.0), AttemptStatus::Valid)),
            lifter("Second", 90.0).with_attempt(round(1), declared(Some(100.0), AttemptStatus::Invalid)),
            lifter("Third", 80.0).with_attempt(round(1), declared(Some(110.0), AttemptStatus::Valid)),
        ];

        let order = reorder(&flight, Round::FIRST);

        assert_eq!(names(&order), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_reorder_sorts_judged_by_next_weight_with_undeclared_last() {
        let flight = vec![
            lifter("NoNext", 70.0).with_attempt(round(1), declared(Some(120.0), AttemptStatus::Valid)),
            lifter("Heavy", 90.0)
                .with_attempt(round(1), declared(Some(100.0), AttemptStatus::Valid))
                .with_attempt(round(2), declared(Some(115.0), AttemptStatus::Pending)),
            lifter("Light", 80.0)
                .with_attempt(round(1), declared(Some(100.0), AttemptStatus::Invalid))
                .with_attempt(round(2), declared(Some(100.0), AttemptStatus::Pending)),
            lifter("Pending", 60.0).with_attempt(round(1), declared(Some(80.0), AttemptStatus::Pending)),
        ];

        let order = reorder(&flight, Round::FIRST);

        assert_eq!(names(&order), vec!["Light", "Heavy", "NoNext", "Pending"]);
    }

    #[test]
    fn test_display_comparator_is_consistent_with_reversed_arguments() {
        let flight = opening_flight();
        for a in &flight {
            for b in &flight {
                assert_eq!(
                    compare_for_display(a, b, Round::FIRST),
                    compare_for_display(b, a, Round::FIRST).reverse()
                );
            }
        }
    }

    #[test]
    fn test_next_in_sequence_moves_to_following_round() {
        // Arrange
        let flight = vec![
            lifter("A", 75.0)
                .with_attempt(round(1), declared(Some(100.0), AttemptStatus::Valid))
                .with_attempt(round(2), declared(Some(105.0), AttemptStatus::Pending)),
            lifter("B", 70.0)
                .with_attempt(round(1), declared(Some(95.0), AttemptStatus::Invalid))
                .with_attempt(round(2), declared(Some(95.0), AttemptStatus::Pending)),
        ];

        // Act
        let progression = next_in_sequence(&flight, Round::FIRST);

        // Assert
        assert_eq!(
            progression,
            Progression::Active {
                round: round(2),
                competitor_id: flight[1].competitor_id,
            }
        );
    }

    #[test]
    fn test_next_in_sequence_completes_after_last_round() {
        let lifter_set = (1..=3).fold(lifter("A", 75.0), |set, n| {
            set.with_attempt(round(n), declared(Some(100.0), AttemptStatus::Valid))
        });

        assert_eq!(
            next_in_sequence(&[lifter_set], Round::FIRST),
            Progression::Completed
        );
    }

    #[test]
    fn test_completed_progression_points_at_nobody() {
        let context = JudgingContext::new(Uuid::new_v4(), Uuid::new_v4());

        let state = Progression::Completed.to_state(context, 4, Utc::now());

        assert!(state.completed);
        assert_eq!(state.current_competitor_id, None);
        assert_eq!(state.round, Round::LAST);
        assert_eq!(state.version, 4);
    }
}
