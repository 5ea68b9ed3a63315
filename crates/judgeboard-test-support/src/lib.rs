//! Shared test doubles and fixtures for the Judgeboard judging engine.

mod broadcast;
mod clock;
mod store;

pub use broadcast::{FailingBroadcaster, PublishedEvent, RecordingBroadcaster};
pub use clock::{FixedClock, ManualClock};
pub use store::{FailingStore, InMemoryJudgingStore};
