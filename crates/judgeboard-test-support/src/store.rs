//! Test stores: in-memory `AttemptStore` / `CurrentStateStore` implementations.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use judgeboard_core::attempt::{
    Attempt, AttemptEntry, AttemptStatus, CompetitorAttemptSet, Round,
};
use judgeboard_core::context::JudgingContext;
use judgeboard_core::error::DomainError;
use judgeboard_core::progression::CurrentState;
use judgeboard_core::store::{AttemptStore, CurrentStateStore};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct CompetitorRecord {
    id: Uuid,
    group_id: Uuid,
    name: String,
    bodyweight: Option<f64>,
}

#[derive(Debug, Default)]
struct StoreState {
    competitors: Vec<CompetitorRecord>,
    attempts: Vec<Attempt>,
    states: HashMap<JudgingContext, CurrentState>,
    status_writes: usize,
    state_writes: usize,
}

/// An in-memory store implementing both store capabilities. Competitors and
/// attempts are seeded by the test; writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct InMemoryJudgingStore {
    state: Mutex<StoreState>,
    fail_status_writes: AtomicBool,
    fail_state_writes: AtomicBool,
}

impl InMemoryJudgingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a competitor in `group_id` and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_competitor(&self, group_id: Uuid, name: &str, bodyweight: Option<f64>) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().competitors.push(CompetitorRecord {
            id,
            group_id,
            name: name.to_owned(),
            bodyweight,
        });
        id
    }

    /// Declare a PENDING attempt and return its id.
    ///
    /// # Panics
    ///
    /// Panics if `round` is not 1, 2 or 3, if the competitor was not added,
    /// or if the internal mutex is poisoned.
    pub fn declare_attempt(
        &self,
        competitor_id: Uuid,
        lift_id: Uuid,
        round: u8,
        weight: Option<f64>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        let group_id = state
            .competitors
            .iter()
            .find(|c| c.id == competitor_id)
            .map(|c| c.group_id)
            .expect("competitor must be added before declaring attempts");
        state.attempts.push(Attempt {
            id,
            competitor_id,
            group_id,
            lift_id,
            round: Round::new(round).expect("round must be 1..=3"),
            weight,
            status: AttemptStatus::Pending,
            override_reason: None,
        });
        id
    }

    /// Overwrite an attempt's status without counting it as an engine write.
    ///
    /// # Panics
    ///
    /// Panics if the attempt does not exist or the mutex is poisoned.
    pub fn set_status(&self, attempt_id: Uuid, status: AttemptStatus) {
        let mut state = self.state.lock().unwrap();
        let attempt = state
            .attempts
            .iter_mut()
            .find(|a| a.id == attempt_id)
            .expect("attempt must exist");
        attempt.status = status;
    }

    /// Returns a snapshot of one attempt.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn attempt(&self, attempt_id: Uuid) -> Option<Attempt> {
        self.state
            .lock()
            .unwrap()
            .attempts
            .iter()
            .find(|a| a.id == attempt_id)
            .cloned()
    }

    /// Returns the stored pointer for a context.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn current_state(&self, context: &JudgingContext) -> Option<CurrentState> {
        self.state.lock().unwrap().states.get(context).cloned()
    }

    /// Number of successful attempt-status writes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn status_write_count(&self) -> usize {
        self.state.lock().unwrap().status_writes
    }

    /// Number of successful current-state writes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn state_write_count(&self) -> usize {
        self.state.lock().unwrap().state_writes
    }

    /// Make every subsequent attempt-status write fail (or succeed again).
    pub fn fail_status_writes(&self, fail: bool) {
        self.fail_status_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent current-state write fail (or succeed again).
    pub fn fail_state_writes(&self, fail: bool) {
        self.fail_state_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AttemptStore for InMemoryJudgingStore {
    async fn load_competitor_attempts(
        &self,
        context: &JudgingContext,
    ) -> Result<Vec<CompetitorAttemptSet>, DomainError> {
        let state = self.state.lock().unwrap();
        let sets = state
            .competitors
            .iter()
            .filter(|c| c.group_id == context.group_id)
            .map(|c| {
                state
                    .attempts
                    .iter()
                    .filter(|a| a.competitor_id == c.id && a.lift_id == context.lift_id)
                    .fold(
                        CompetitorAttemptSet::new(c.id, c.name.clone(), c.bodyweight),
                        |set, a| {
                            set.with_attempt(
                                a.round,
                                AttemptEntry {
                                    attempt_id: a.id,
                                    weight: a.weight,
                                    status: a.status,
                                },
                            )
                        },
                    )
            })
            .collect();
        Ok(sets)
    }

    async fn load_attempt(&self, attempt_id: Uuid) -> Result<Option<Attempt>, DomainError> {
        Ok(self.attempt(attempt_id))
    }

    async fn update_attempt_status(
        &self,
        attempt_id: Uuid,
        status: AttemptStatus,
        override_reason: Option<String>,
    ) -> Result<(), DomainError> {
        if self.fail_status_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure("connection refused".into()));
        }
        let mut state = self.state.lock().unwrap();
        let attempt = state
            .attempts
            .iter_mut()
            .find(|a| a.id == attempt_id)
            .ok_or(DomainError::AttemptNotFound(attempt_id))?;
        attempt.status = status;
        attempt.override_reason = override_reason;
        state.status_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl CurrentStateStore for InMemoryJudgingStore {
    async fn load_current_state(
        &self,
        context: &JudgingContext,
    ) -> Result<Option<CurrentState>, DomainError> {
        Ok(self.current_state(context))
    }

    async fn save_current_state(
        &self,
        current: &CurrentState,
        expected_version: i64,
    ) -> Result<(), DomainError> {
        if self.fail_state_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure("connection refused".into()));
        }
        let mut state = self.state.lock().unwrap();
        let actual = state
            .states
            .get(&current.context)
            .map_or(0, |stored| stored.version);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                context: current.context,
                expected: expected_version,
                actual,
            });
        }
        state.states.insert(current.context, current.clone());
        state.state_writes += 1;
        Ok(())
    }
}

/// A store that always returns an infrastructure error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingStore;

#[async_trait]
impl AttemptStore for FailingStore {
    async fn load_competitor_attempts(
        &self,
        _context: &JudgingContext,
    ) -> Result<Vec<CompetitorAttemptSet>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_attempt(&self, _attempt_id: Uuid) -> Result<Option<Attempt>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn update_attempt_status(
        &self,
        _attempt_id: Uuid,
        _status: AttemptStatus,
        _override_reason: Option<String>,
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

#[async_trait]
impl CurrentStateStore for FailingStore {
    async fn load_current_state(
        &self,
        _context: &JudgingContext,
    ) -> Result<Option<CurrentState>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn save_current_state(
        &self,
        _state: &CurrentState,
        _expected_version: i64,
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_competitor_sets_only_include_context_lift() {
        // Arrange
        let store = InMemoryJudgingStore::new();
        let group_id = Uuid::new_v4();
        let squat = Uuid::new_v4();
        let bench = Uuid::new_v4();
        let athlete = store.add_competitor(group_id, "A", Some(80.0));
        store.add_competitor(Uuid::new_v4(), "Other group", Some(70.0));
        let squat_opener = store.declare_attempt(athlete, squat, 1, Some(150.0));
        store.declare_attempt(athlete, bench, 1, Some(100.0));

        // Act
        let sets = store
            .load_competitor_attempts(&JudgingContext::new(group_id, squat))
            .await
            .unwrap();

        // Assert
        assert_eq!(sets.len(), 1);
        let entry = sets[0].attempt(Round::FIRST).unwrap();
        assert_eq!(entry.attempt_id, squat_opener);
        assert_eq!(entry.weight, Some(150.0));
        assert!(sets[0].attempt(Round::LAST).is_none());
    }

    #[tokio::test]
    async fn test_save_current_state_rejects_stale_version() {
        let store = InMemoryJudgingStore::new();
        let context = JudgingContext::new(Uuid::new_v4(), Uuid::new_v4());
        let mut state = CurrentState::initial(context);
        state.version = 1;
        store.save_current_state(&state, 0).await.unwrap();

        let result = store.save_current_state(&state, 0).await;

        match result.unwrap_err() {
            DomainError::ConcurrencyConflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
    }
}
