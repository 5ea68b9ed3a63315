//! Engine configuration.

use std::time::Duration;

/// Tunables shared by the vote aggregator and progression controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgingConfig {
    /// How long an unfinished voting round survives before it is discarded.
    pub vote_timeout: Duration,
    /// Deadline for every attempt-store and current-state-store call.
    pub store_timeout: Duration,
    /// Deadline for every broadcast publish.
    pub broadcast_timeout: Duration,
    /// Attempt clock length used when a timer start does not name one.
    pub default_timer: Duration,
}

impl Default for JudgingConfig {
    fn default() -> Self {
        Self {
            vote_timeout: Duration::from_secs(60),
            store_timeout: Duration::from_secs(5),
            broadcast_timeout: Duration::from_secs(2),
            default_timer: Duration::from_secs(60),
        }
    }
}
