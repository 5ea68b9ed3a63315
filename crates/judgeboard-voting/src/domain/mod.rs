//! Domain layer for the Vote Aggregation context.

pub mod commands;
pub mod events;
pub mod round;
pub mod timer;
