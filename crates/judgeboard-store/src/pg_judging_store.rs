//! `PostgreSQL` implementation of the `AttemptStore` and `CurrentStateStore`
//! traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use judgeboard_core::attempt::{
    Attempt, AttemptEntry, AttemptStatus, CompetitorAttemptSet, Round,
};
use judgeboard_core::context::JudgingContext;
use judgeboard_core::error::DomainError;
use judgeboard_core::progression::CurrentState;
use judgeboard_core::store::{AttemptStore, CurrentStateStore};

use crate::schema;

/// PostgreSQL-backed attempt and progression store.
#[derive(Debug, Clone)]
pub struct PgJudgingStore {
    pool: PgPool,
}

impl PgJudgingStore {
    /// Creates a new `PgJudgingStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CompetitorAttemptRow {
    competitor_id: Uuid,
    name: String,
    bodyweight: Option<f64>,
    attempt_id: Option<Uuid>,
    round: Option<i16>,
    weight: Option<f64>,
    status: Option<String>,
}

#[derive(sqlx::FromRow)]
struct AttemptRow {
    id: Uuid,
    competitor_id: Uuid,
    group_id: Uuid,
    lift_id: Uuid,
    round: i16,
    weight: Option<f64>,
    status: String,
    override_reason: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CurrentStateRow {
    round: i16,
    current_competitor_id: Option<Uuid>,
    completed: bool,
    version: i64,
    updated_at: Option<DateTime<Utc>>,
}

fn infrastructure(e: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

fn round_from_column(value: i16) -> Result<Round, DomainError> {
    let number = u8::try_from(value)
        .map_err(|_| DomainError::Infrastructure(format!("stored round out of range: {value}")))?;
    Round::new(number)
}

fn round_to_column(round: Round) -> i16 {
    i16::from(round.number())
}

#[async_trait]
impl AttemptStore for PgJudgingStore {
    async fn load_competitor_attempts(
        &self,
        context: &JudgingContext,
    ) -> Result<Vec<CompetitorAttemptSet>, DomainError> {
        let rows: Vec<CompetitorAttemptRow> = sqlx::query_as(schema::SELECT_COMPETITOR_ATTEMPTS)
            .bind(context.group_id)
            .bind(context.lift_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;

        let mut sets: Vec<CompetitorAttemptSet> = Vec::new();
        for row in rows {
            if sets.last().is_none_or(|set| set.competitor_id != row.competitor_id) {
                sets.push(CompetitorAttemptSet::new(
                    row.competitor_id,
                    row.name,
                    row.bodyweight,
                ));
            }
            let (Some(attempt_id), Some(round), Some(status)) =
                (row.attempt_id, row.round, row.status)
            else {
                continue;
            };
            let entry = AttemptEntry {
                attempt_id,
                weight: row.weight,
                status: AttemptStatus::parse(&status)?,
            };
            let round = round_from_column(round)?;
            if let Some(set) = sets.last_mut() {
                set.attempts[round.index()] = Some(entry);
            }
        }

        debug!(%context, competitors = sets.len(), "competitor attempts loaded");
        Ok(sets)
    }

    async fn load_attempt(&self, attempt_id: Uuid) -> Result<Option<Attempt>, DomainError> {
        let row: Option<AttemptRow> = sqlx::query_as(schema::SELECT_ATTEMPT)
            .bind(attempt_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;

        row.map(|row| {
            Ok(Attempt {
                id: row.id,
                competitor_id: row.competitor_id,
                group_id: row.group_id,
                lift_id: row.lift_id,
                round: round_from_column(row.round)?,
                weight: row.weight,
                status: AttemptStatus::parse(&row.status)?,
                override_reason: row.override_reason,
            })
        })
        .transpose()
    }

    async fn update_attempt_status(
        &self,
        attempt_id: Uuid,
        status: AttemptStatus,
        override_reason: Option<String>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(schema::UPDATE_ATTEMPT_STATUS)
            .bind(attempt_id)
            .bind(status.as_str())
            .bind(override_reason)
            .execute(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AttemptNotFound(attempt_id));
        }
        Ok(())
    }
}

#[async_trait]
impl CurrentStateStore for PgJudgingStore {
    async fn load_current_state(
        &self,
        context: &JudgingContext,
    ) -> Result<Option<CurrentState>, DomainError> {
        let row: Option<CurrentStateRow> = sqlx::query_as(schema::SELECT_CURRENT_STATE)
            .bind(context.group_id)
            .bind(context.lift_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;

        row.map(|row| {
            Ok(CurrentState {
                context: *context,
                round: round_from_column(row.round)?,
                current_competitor_id: row.current_competitor_id,
                completed: row.completed,
                version: row.version,
                updated_at: row.updated_at,
            })
        })
        .transpose()
    }

    async fn save_current_state(
        &self,
        state: &CurrentState,
        expected_version: i64,
    ) -> Result<(), DomainError> {
        let context = state.context;
        let query = if expected_version == 0 {
            sqlx::query(schema::INSERT_CURRENT_STATE)
                .bind(context.group_id)
                .bind(context.lift_id)
                .bind(round_to_column(state.round))
                .bind(state.current_competitor_id)
                .bind(state.completed)
                .bind(state.version)
                .bind(state.updated_at)
        } else {
            sqlx::query(schema::UPDATE_CURRENT_STATE)
                .bind(context.group_id)
                .bind(context.lift_id)
                .bind(round_to_column(state.round))
                .bind(state.current_competitor_id)
                .bind(state.completed)
                .bind(state.version)
                .bind(state.updated_at)
                .bind(expected_version)
        };
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let actual: Option<(i64,)> = sqlx::query_as(schema::SELECT_CURRENT_VERSION)
            .bind(context.group_id)
            .bind(context.lift_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;
        Err(DomainError::ConcurrencyConflict {
            context,
            expected: expected_version,
            actual: actual.map_or(0, |(version,)| version),
        })
    }
}
