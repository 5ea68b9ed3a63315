//! Judgeboard — Ordering & Progression bounded context.
//!
//! Responsible for the lifting order of a group and the per-context
//! "current competitor" pointer that moves after every recorded verdict.

pub mod application;
pub mod domain;
