//! Application layer for the Vote Aggregation context.

pub mod command_handlers;
pub mod query_handlers;
pub mod timer_handlers;
