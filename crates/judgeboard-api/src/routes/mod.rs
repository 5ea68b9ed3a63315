//! Route modules organized by bounded context.

pub mod health;
pub mod judging;
pub mod progression;

use axum::Router;

use crate::state::AppState;

/// Builds the full API router over `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/judging", judging::router())
        .nest("/api/v1/progression", progression::router())
        .with_state(state)
}
