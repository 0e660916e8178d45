//! Runtime layer for dengue-etl.
//!
//! Sequences the normalization engine over every source file
//! ([`orchestrator`]) and wraps it with the cache check, listing, persisting
//! and response envelope of one invocation ([`handler`]).

pub mod handler;
pub mod orchestrator;
