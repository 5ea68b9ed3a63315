//! Attempt clock handlers.
//!
//! Clock state is per context and lives only in this process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use judgeboard_core::broadcast::{Broadcaster, publish_event};
use judgeboard_core::clock::Clock;
use judgeboard_core::command::Command;
use judgeboard_core::config::JudgingConfig;
use judgeboard_core::context::JudgingContext;
use judgeboard_core::error::DomainError;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::commands::{ControlTimer, TimerAction};
use crate::domain::events::{
    JudgingEvent, JudgingEventKind, TimerReset, TimerStarted, TimerStopped,
};
use crate::domain::timer::AttemptTimer;

/// The attempt clock as seen after a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerView {
    /// Whether the clock is counting down.
    pub running: bool,
    /// Full countdown length, when running.
    pub duration_secs: Option<u64>,
    /// Seconds left: the running remainder, or the remainder at stop.
    pub remaining_secs: Option<u64>,
}

/// Per-context attempt clocks.
pub struct AttemptTimers {
    timers: Mutex<HashMap<JudgingContext, AttemptTimer>>,
    broadcaster: Arc<dyn Broadcaster>,
    clock: Arc<dyn Clock>,
    config: JudgingConfig,
}

impl AttemptTimers {
    /// Creates an empty clock registry.
    #[must_use]
    pub fn new(broadcaster: Arc<dyn Broadcaster>, clock: Arc<dyn Clock>, config: JudgingConfig) -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
            broadcaster,
            clock,
            config,
        }
    }

    /// Handles `ControlTimer`.
    ///
    /// Starting a running clock restarts it. Stopping a clock that is not
    /// running changes nothing and publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when asked to start a zero-length
    /// countdown.
    pub async fn handle(&self, command: &ControlTimer) -> Result<TimerView, DomainError> {
        let context = command.context;
        let now = self.clock.now();

        let (view, kind) = match command.action {
            TimerAction::Start(duration) => {
                let duration = duration.unwrap_or(self.config.default_timer);
                if duration.is_zero() {
                    return Err(DomainError::Validation(
                        "timer duration must be positive".to_owned(),
                    ));
                }
                self.lock().insert(
                    context,
                    AttemptTimer {
                        started_at: now,
                        duration,
                    },
                );
                info!(%context, duration_secs = duration.as_secs(), "attempt timer started");
                (
                    TimerView {
                        running: true,
                        duration_secs: Some(duration.as_secs()),
                        remaining_secs: Some(duration.as_secs()),
                    },
                    JudgingEventKind::TimerStarted(TimerStarted {
                        duration_secs: duration.as_secs(),
                    }),
                )
            }
            TimerAction::Stop => {
                let stopped = self.lock().remove(&context);
                let Some(timer) = stopped else {
                    debug!(%context, "stop requested for idle timer");
                    return Ok(TimerView {
                        running: false,
                        duration_secs: None,
                        remaining_secs: None,
                    });
                };
                let remaining_secs = timer.remaining(now).as_secs();
                info!(%context, remaining_secs, "attempt timer stopped");
                (
                    TimerView {
                        running: false,
                        duration_secs: None,
                        remaining_secs: Some(remaining_secs),
                    },
                    JudgingEventKind::TimerStopped(TimerStopped { remaining_secs }),
                )
            }
            TimerAction::Reset => {
                self.lock().remove(&context);
                info!(%context, "attempt timer reset");
                (
                    TimerView {
                        running: false,
                        duration_secs: None,
                        remaining_secs: None,
                    },
                    JudgingEventKind::TimerReset(TimerReset {}),
                )
            }
        };

        let event = JudgingEvent::new(context, command.correlation_id(), now, kind);
        publish_event(self.broadcaster.as_ref(), &event, self.config.broadcast_timeout).await;
        Ok(view)
    }

    /// Current clock for a context.
    #[must_use]
    pub fn view(&self, context: JudgingContext) -> TimerView {
        let now = self.clock.now();
        match self.lock().get(&context) {
            Some(timer) => TimerView {
                running: true,
                duration_secs: Some(timer.duration.as_secs()),
                remaining_secs: Some(timer.remaining(now).as_secs()),
            },
            None => TimerView {
                running: false,
                duration_secs: None,
                remaining_secs: None,
            },
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<JudgingContext, AttemptTimer>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
