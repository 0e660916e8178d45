//! Domain types shared by every dengue-etl crate.
//!
//! Holds the error taxonomy, the aggregate tree and its records, the header
//! text normalizer with the period classifier, and the CLI settings.

pub mod error;
pub mod models;
pub mod settings;
pub mod text;
