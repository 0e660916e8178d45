//! CSV normalization engine for dengue-etl.
//!
//! Responsible for reaching the object store, decoding legacy-encoded
//! exports, locating the real header row, classifying row fields and folding
//! records into the aggregate tree.

pub mod aggregator;
pub mod fields;
pub mod layout;
pub mod reader;
pub mod store;

pub use dengue_core as core;
