//! Bounded deadlines for external calls.

use std::future::Future;
use std::time::Duration;

use crate::error::DomainError;

/// Runs `future` with a deadline; an elapsed deadline becomes
/// `DomainError::Timeout` naming `operation`.
///
/// # Errors
///
/// Returns the future's own error, or `DomainError::Timeout`.
pub async fn within<T, F>(operation: &'static str, limit: Duration, future: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::Timeout {
            operation,
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
