//! Integration tests for `PgJudgingStore`.

use chrono::{TimeZone, Utc};
use judgeboard_core::attempt::{AttemptStatus, Round};
use judgeboard_core::context::JudgingContext;
use judgeboard_core::error::DomainError;
use judgeboard_core::progression::CurrentState;
use judgeboard_core::store::{AttemptStore, CurrentStateStore};
use judgeboard_store::pg_judging_store::PgJudgingStore;
use sqlx::PgPool;
use uuid::Uuid;

async fn insert_competitor(pool: &PgPool, group_id: Uuid, name: &str, bodyweight: Option<f64>) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO competitors (id, group_id, name, bodyweight) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(group_id)
        .bind(name)
        .bind(bodyweight)
        .execute(pool)
        .await
        .unwrap();
    id
}

async fn insert_attempt(pool: &PgPool, competitor_id: Uuid, lift_id: Uuid, round: i16, weight: Option<f64>) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO attempts (id, competitor_id, lift_id, round, weight) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(competitor_id)
    .bind(lift_id)
    .bind(round)
    .bind(weight)
    .execute(pool)
    .await
    .unwrap();
    id
}

fn context() -> JudgingContext {
    JudgingContext::new(Uuid::new_v4(), Uuid::new_v4())
}

// --- attempts ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_load_competitor_attempts_groups_rows_by_competitor(pool: PgPool) {
    let store = PgJudgingStore::new(pool.clone());
    let ctx = context();
    let a = insert_competitor(&pool, ctx.group_id, "A", Some(75.0)).await;
    let b = insert_competitor(&pool, ctx.group_id, "B", None).await;
    let opener = insert_attempt(&pool, a, ctx.lift_id, 1, Some(100.0)).await;
    insert_attempt(&pool, a, ctx.lift_id, 2, None).await;
    // Same competitor, other lift: must not appear.
    insert_attempt(&pool, a, Uuid::new_v4(), 1, Some(200.0)).await;

    let sets = store.load_competitor_attempts(&ctx).await.unwrap();

    assert_eq!(sets.len(), 2);
    let set_a = sets.iter().find(|s| s.competitor_id == a).unwrap();
    assert_eq!(set_a.attempt(Round::FIRST).unwrap().attempt_id, opener);
    assert_eq!(set_a.weight(Round::FIRST), Some(100.0));
    assert_eq!(set_a.weight(Round::new(2).unwrap()), None);
    assert!(set_a.attempt(Round::new(2).unwrap()).is_some());
    assert!(set_a.attempt(Round::LAST).is_none());
    let set_b = sets.iter().find(|s| s.competitor_id == b).unwrap();
    assert_eq!(set_b.bodyweight, None);
    assert!(set_b.attempts.iter().all(Option::is_none));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_load_competitor_attempts_is_empty_for_unknown_group(pool: PgPool) {
    let store = PgJudgingStore::new(pool);

    let sets = store.load_competitor_attempts(&context()).await.unwrap();

    assert!(sets.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_update_attempt_status_records_reason(pool: PgPool) {
    let store = PgJudgingStore::new(pool.clone());
    let ctx = context();
    let a = insert_competitor(&pool, ctx.group_id, "A", Some(75.0)).await;
    let opener = insert_attempt(&pool, a, ctx.lift_id, 1, Some(100.0)).await;

    store
        .update_attempt_status(opener, AttemptStatus::Invalid, Some("forced invalid".into()))
        .await
        .unwrap();

    let attempt = store.load_attempt(opener).await.unwrap().unwrap();
    assert_eq!(attempt.status, AttemptStatus::Invalid);
    assert_eq!(attempt.override_reason.as_deref(), Some("forced invalid"));
    assert_eq!(attempt.round, Round::FIRST);
    assert_eq!(attempt.lift_id, ctx.lift_id);
    assert_eq!(attempt.group_id, ctx.group_id);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_update_unknown_attempt_is_not_found(pool: PgPool) {
    let store = PgJudgingStore::new(pool);
    let missing = Uuid::new_v4();

    let result = store
        .update_attempt_status(missing, AttemptStatus::Valid, None)
        .await;

    assert!(matches!(result, Err(DomainError::AttemptNotFound(id)) if id == missing));
    assert!(store.load_attempt(missing).await.unwrap().is_none());
}

// --- current state ---

fn state(ctx: JudgingContext, version: i64, competitor: Option<Uuid>) -> CurrentState {
    CurrentState {
        context: ctx,
        round: Round::FIRST,
        current_competitor_id: competitor,
        completed: false,
        version,
        updated_at: Some(Utc.with_ymd_and_hms(2026, 5, 2, 11, 0, 0).unwrap()),
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_current_state_round_trip(pool: PgPool) {
    let store = PgJudgingStore::new(pool);
    let ctx = context();
    assert!(store.load_current_state(&ctx).await.unwrap().is_none());

    let first = state(ctx, 1, Some(Uuid::new_v4()));
    store.save_current_state(&first, 0).await.unwrap();
    let second = state(ctx, 2, None);
    store.save_current_state(&second, 1).await.unwrap();

    assert_eq!(store.load_current_state(&ctx).await.unwrap(), Some(second));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_save_current_state_rejects_stale_version(pool: PgPool) {
    let store = PgJudgingStore::new(pool);
    let ctx = context();
    store.save_current_state(&state(ctx, 1, None), 0).await.unwrap();
    store.save_current_state(&state(ctx, 2, None), 1).await.unwrap();

    let result = store.save_current_state(&state(ctx, 2, None), 1).await;

    match result {
        Err(DomainError::ConcurrencyConflict {
            context,
            expected,
            actual,
        }) => {
            assert_eq!(context, ctx);
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_second_first_write_conflicts(pool: PgPool) {
    let store = PgJudgingStore::new(pool);
    let ctx = context();
    store.save_current_state(&state(ctx, 1, None), 0).await.unwrap();

    let result = store.save_current_state(&state(ctx, 1, None), 0).await;

    assert!(matches!(
        result,
        Err(DomainError::ConcurrencyConflict {
            expected: 0,
            actual: 1,
            ..
        })
    ));
}
