//! Judgeboard — `PostgreSQL` persistence for attempts and progression
//! pointers.

pub mod pg_judging_store;
pub mod schema;
