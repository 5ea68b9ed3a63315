//! Attempt clock: the countdown a lifter has to start the attempt.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// A running attempt clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptTimer {
    /// When the clock was started.
    pub started_at: DateTime<Utc>,
    /// Full length of the countdown.
    pub duration: Duration,
}

impl AttemptTimer {
    /// Time left on the clock at `now`, never below zero.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = (now - self.started_at).to_std().unwrap_or_default();
        self.duration.saturating_sub(elapsed)
    }
}
