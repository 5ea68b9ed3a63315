//! Judgeboard API server entry point.

use std::sync::Arc;

use judgeboard_api::broadcast::EventBus;
use judgeboard_api::config::AppConfig;
use judgeboard_api::error::AppError;
use judgeboard_api::routes;
use judgeboard_api::state::AppState;
use judgeboard_core::clock::SystemClock;
use judgeboard_store::pg_judging_store::PgJudgingStore;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("starting judgeboard API server");

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let store = Arc::new(PgJudgingStore::new(pool));
    let app_state = AppState::new(
        Arc::new(SystemClock),
        store.clone(),
        store,
        Arc::new(EventBus::default()),
        config.judging,
    );

    // TODO: Replace CorsLayer::permissive() with the scoreboard origins once deployment hosts are fixed.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.listen_addr()?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
