//! Application layer for the Ordering & Progression context.

pub mod command_handlers;
pub mod query_handlers;
