//! Judgeboard — Vote Aggregation bounded context.
//!
//! Responsible for collecting the three judges' votes on the attempt in
//! play, turning them into a majority verdict, director overrides, and the
//! attempt clock.

pub mod application;
pub mod domain;
