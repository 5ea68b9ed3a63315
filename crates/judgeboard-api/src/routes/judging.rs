//! Routes for the Vote Aggregation bounded context.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use judgeboard_core::attempt::AttemptStatus;
use judgeboard_core::context::JudgingContext;
use judgeboard_core::judge::JudgePosition;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use judgeboard_voting::application::command_handlers::{RetryResult, VoteResult};
use judgeboard_voting::application::query_handlers::{self, VoteStatusView};
use judgeboard_voting::application::timer_handlers::TimerView;
use judgeboard_voting::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /votes.
#[derive(Debug, Deserialize)]
pub struct SubmitVoteRequest {
    /// Group of the context.
    pub group_id: Uuid,
    /// Lift of the context.
    pub lift_id: Uuid,
    /// The attempt being judged.
    pub attempt_id: Uuid,
    /// The judge's seat.
    pub judge_position: JudgePosition,
    /// `true` for a good lift.
    pub verdict: bool,
}

/// Request body for POST /force-invalid.
#[derive(Debug, Deserialize)]
pub struct ForceInvalidRequest {
    /// Group of the context.
    pub group_id: Uuid,
    /// Lift of the context.
    pub lift_id: Uuid,
    /// The attempt to invalidate.
    pub attempt_id: Uuid,
    /// Optional reason recorded on the attempt.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for POST /corrections.
#[derive(Debug, Deserialize)]
pub struct CorrectionRequest {
    /// Group of the context.
    pub group_id: Uuid,
    /// Lift of the context.
    pub lift_id: Uuid,
    /// The attempt to correct.
    pub attempt_id: Uuid,
    /// VALID or INVALID.
    pub status: AttemptStatus,
    /// Optional reason recorded on the attempt.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for POST /retry-verdicts.
#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    /// Group of the context.
    pub group_id: Uuid,
    /// Lift of the context.
    pub lift_id: Uuid,
}

/// Attempt clock action.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerActionRequest {
    /// Start (or restart) the countdown.
    Start,
    /// Stop the countdown.
    Stop,
    /// Clear the countdown.
    Reset,
}

/// Request body for POST /timer.
#[derive(Debug, Deserialize)]
pub struct TimerRequest {
    /// Group of the context.
    pub group_id: Uuid,
    /// Lift of the context.
    pub lift_id: Uuid,
    /// What to do with the clock.
    pub action: TimerActionRequest,
    /// Countdown length for `start`; the configured default when absent.
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

/// POST /votes
#[instrument(
    skip(state, request),
    fields(
        group_id = %request.group_id,
        lift_id = %request.lift_id,
        attempt_id = %request.attempt_id,
        position = %request.judge_position
    )
)]
async fn submit_vote(
    State(state): State<AppState>,
    Json(request): Json<SubmitVoteRequest>,
) -> Result<Json<VoteResult>, ApiError> {
    let command = commands::SubmitVote {
        correlation_id: Uuid::new_v4(),
        context: JudgingContext::new(request.group_id, request.lift_id),
        attempt_id: request.attempt_id,
        position: request.judge_position,
        verdict: request.verdict,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_vote command");

    let result = state.aggregator.submit_vote(&command).await?;

    Ok(Json(result))
}

/// POST /force-invalid
#[instrument(
    skip(state, request),
    fields(group_id = %request.group_id, lift_id = %request.lift_id, attempt_id = %request.attempt_id)
)]
async fn force_invalid(
    State(state): State<AppState>,
    Json(request): Json<ForceInvalidRequest>,
) -> Result<Json<VoteResult>, ApiError> {
    let command = commands::ForceInvalid {
        correlation_id: Uuid::new_v4(),
        context: JudgingContext::new(request.group_id, request.lift_id),
        attempt_id: request.attempt_id,
        reason: request.reason,
    };

    info!(correlation_id = %command.correlation_id, "handling force_invalid command");

    let result = state.aggregator.force_invalid(&command).await?;

    Ok(Json(result))
}

/// POST /corrections
#[instrument(
    skip(state, request),
    fields(group_id = %request.group_id, lift_id = %request.lift_id, attempt_id = %request.attempt_id)
)]
async fn correct_attempt(
    State(state): State<AppState>,
    Json(request): Json<CorrectionRequest>,
) -> Result<Json<VoteResult>, ApiError> {
    let command = commands::CorrectAttempt {
        correlation_id: Uuid::new_v4(),
        context: JudgingContext::new(request.group_id, request.lift_id),
        attempt_id: request.attempt_id,
        status: request.status,
        reason: request.reason,
    };

    info!(correlation_id = %command.correlation_id, "handling correct_attempt command");

    let result = state.aggregator.correct_attempt(&command).await?;

    Ok(Json(result))
}

/// POST /retry-verdicts
#[instrument(skip(state, request), fields(group_id = %request.group_id, lift_id = %request.lift_id))]
async fn retry_verdicts(
    State(state): State<AppState>,
    Json(request): Json<ContextRequest>,
) -> Result<Json<RetryResult>, ApiError> {
    let command = commands::RetryPendingVerdicts {
        correlation_id: Uuid::new_v4(),
        context: JudgingContext::new(request.group_id, request.lift_id),
    };

    info!(correlation_id = %command.correlation_id, "handling retry_pending_verdicts command");

    let result = state.aggregator.retry_pending_verdicts(&command).await?;

    Ok(Json(result))
}

/// POST /timer
#[instrument(skip(state, request), fields(group_id = %request.group_id, lift_id = %request.lift_id))]
async fn control_timer(
    State(state): State<AppState>,
    Json(request): Json<TimerRequest>,
) -> Result<Json<TimerView>, ApiError> {
    let action = match request.action {
        TimerActionRequest::Start => {
            commands::TimerAction::Start(request.duration_secs.map(Duration::from_secs))
        }
        TimerActionRequest::Stop => commands::TimerAction::Stop,
        TimerActionRequest::Reset => commands::TimerAction::Reset,
    };
    let command = commands::ControlTimer {
        correlation_id: Uuid::new_v4(),
        context: JudgingContext::new(request.group_id, request.lift_id),
        action,
    };

    info!(correlation_id = %command.correlation_id, ?action, "handling control_timer command");

    let view = state.timers.handle(&command).await?;

    Ok(Json(view))
}

/// GET /{group_id}/{lift_id}/votes
async fn get_vote_status(
    State(state): State<AppState>,
    Path((group_id, lift_id)): Path<(Uuid, Uuid)>,
) -> Json<VoteStatusView> {
    Json(query_handlers::get_vote_status(
        &state.aggregator,
        JudgingContext::new(group_id, lift_id),
    ))
}

/// GET /{group_id}/{lift_id}/timer
async fn get_timer(
    State(state): State<AppState>,
    Path((group_id, lift_id)): Path<(Uuid, Uuid)>,
) -> Json<TimerView> {
    Json(state.timers.view(JudgingContext::new(group_id, lift_id)))
}

/// Returns the router for the judging context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/votes", post(submit_vote))
        .route("/force-invalid", post(force_invalid))
        .route("/corrections", post(correct_attempt))
        .route("/retry-verdicts", post(retry_verdicts))
        .route("/timer", post(control_timer))
        .route("/{group_id}/{lift_id}/votes", get(get_vote_status))
        .route("/{group_id}/{lift_id}/timer", get(get_timer))
}
