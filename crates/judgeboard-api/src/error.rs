//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use judgeboard_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::AttemptNotFound(_) => (StatusCode::NOT_FOUND, "attempt_not_found"),
            DomainError::AlreadyVoted { .. } => (StatusCode::CONFLICT, "already_voted"),
            DomainError::ConcurrencyConflict { .. } => {
                (StatusCode::CONFLICT, "concurrency_conflict")
            }
            DomainError::VerdictNotPersisted { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "verdict_not_persisted")
            }
            DomainError::VerdictPending { .. } => (StatusCode::CONFLICT, "verdict_pending"),
            DomainError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            DomainError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use judgeboard_core::attempt::AttemptStatus;
    use judgeboard_core::context::JudgingContext;
    use judgeboard_core::judge::JudgePosition;
    use uuid::Uuid;

    fn status_of(err: DomainError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_attempt_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::AttemptNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_already_voted_maps_to_409() {
        assert_eq!(
            status_of(DomainError::AlreadyVoted {
                attempt_id: Uuid::new_v4(),
                position: JudgePosition::Left,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_concurrency_conflict_maps_to_409() {
        assert_eq!(
            status_of(DomainError::ConcurrencyConflict {
                context: JudgingContext::new(Uuid::new_v4(), Uuid::new_v4()),
                expected: 1,
                actual: 2,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_verdict_not_persisted_maps_to_503() {
        assert_eq!(
            status_of(DomainError::VerdictNotPersisted {
                attempt_id: Uuid::new_v4(),
                verdict: AttemptStatus::Valid,
                reason: "db down".into(),
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_verdict_pending_maps_to_409() {
        assert_eq!(
            status_of(DomainError::VerdictPending {
                attempt_id: Uuid::new_v4(),
                verdict: AttemptStatus::Valid,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_timeout_maps_to_504() {
        assert_eq!(
            status_of(DomainError::Timeout {
                operation: "load_attempt",
                after_ms: 5000,
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        assert_eq!(
            status_of(DomainError::Infrastructure("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
