//! Routes for the Ordering & Progression bounded context.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use judgeboard_core::attempt::Round;
use judgeboard_core::context::JudgingContext;
use judgeboard_core::progression::CurrentState;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use judgeboard_progression::application::query_handlers::{self, LiftingOrderView};
use judgeboard_progression::domain::commands::AdvanceProgression;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for a context's progression pointer.
#[derive(Debug, Serialize)]
pub struct CurrentStateResponse {
    /// Group of the context.
    pub group_id: Uuid,
    /// Lift of the context.
    pub lift_id: Uuid,
    /// Round being lifted.
    pub round: Round,
    /// Competitor due next.
    pub current_competitor_id: Option<Uuid>,
    /// Whether the context has finished.
    pub completed: bool,
    /// Pointer version; 0 when never written.
    pub version: i64,
    /// Time of the last write.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CurrentState> for CurrentStateResponse {
    fn from(state: CurrentState) -> Self {
        Self {
            group_id: state.context.group_id,
            lift_id: state.context.lift_id,
            round: state.round,
            current_competitor_id: state.current_competitor_id,
            completed: state.completed,
            version: state.version,
            updated_at: state.updated_at,
        }
    }
}

/// Response body for POST /advance.
#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    /// The pointer as written.
    #[serde(flatten)]
    pub state: CurrentStateResponse,
    /// Whether the pointer moved.
    pub changed: bool,
}

/// Request body for POST /advance.
#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    /// Group of the context.
    pub group_id: Uuid,
    /// Lift of the context.
    pub lift_id: Uuid,
}

/// Query parameters for the lifting-order board.
#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    /// Round to order; the current round when absent.
    pub round: Option<u8>,
}

/// GET /{group_id}/{lift_id}
async fn get_current_state(
    State(state): State<AppState>,
    Path((group_id, lift_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CurrentStateResponse>, ApiError> {
    let current = query_handlers::get_current_state(
        JudgingContext::new(group_id, lift_id),
        &*state.state_store,
        state.config.store_timeout,
    )
    .await?;

    Ok(Json(current.into()))
}

/// GET /{group_id}/{lift_id}/order
async fn get_lifting_order(
    State(state): State<AppState>,
    Path((group_id, lift_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<LiftingOrderView>, ApiError> {
    let round = query.round.map(Round::new).transpose()?;

    let view = query_handlers::get_lifting_order(
        JudgingContext::new(group_id, lift_id),
        round,
        &*state.attempt_store,
        &*state.state_store,
        state.config.store_timeout,
    )
    .await?;

    Ok(Json(view))
}

/// POST /advance
#[instrument(skip(state, request), fields(group_id = %request.group_id, lift_id = %request.lift_id))]
async fn advance(
    State(state): State<AppState>,
    Json(request): Json<AdvanceRequest>,
) -> Result<Json<AdvanceResponse>, ApiError> {
    let command = AdvanceProgression {
        correlation_id: Uuid::new_v4(),
        context: JudgingContext::new(request.group_id, request.lift_id),
    };

    info!(correlation_id = %command.correlation_id, "handling advance_progression command");

    let outcome = state.aggregator.advance_progression(&command).await?;

    Ok(Json(AdvanceResponse {
        state: outcome.state.into(),
        changed: outcome.changed,
    }))
}

/// Returns the router for the progression context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/advance", post(advance))
        .route("/{group_id}/{lift_id}", get(get_current_state))
        .route("/{group_id}/{lift_id}/order", get(get_lifting_order))
}
