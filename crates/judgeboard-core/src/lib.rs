//! Judgeboard Core — shared judging model and capabilities.
//!
//! This crate defines the data model, the capabilities the engine consumes
//! (attempt store, current-state store, broadcaster) and the primitives that
//! every judging context shares. It contains no infrastructure code.

pub mod attempt;
pub mod broadcast;
pub mod clock;
pub mod command;
pub mod config;
pub mod context;
pub mod deadline;
pub mod error;
pub mod event;
pub mod judge;
pub mod lock;
pub mod progression;
pub mod store;
