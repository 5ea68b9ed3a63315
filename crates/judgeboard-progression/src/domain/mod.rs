//! Domain layer for the Ordering & Progression context.

pub mod commands;
pub mod events;
pub mod ordering;
