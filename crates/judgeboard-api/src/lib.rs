//! Judgeboard — HTTP API over the judging engine.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
