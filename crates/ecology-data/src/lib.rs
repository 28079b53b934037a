//! Dataset layer for monster-ecology.
//!
//! Builds canonical rows from raw statblock records, assembles them across
//! pages, persists the dataset, explodes it by environment and runs the
//! aggregation and explorer queries that feed the report.

pub mod aggregator;
pub mod analysis;
pub mod assembler;
pub mod builder;
pub mod exploder;
pub mod explorer;
pub mod store;

pub use ecology_core as core;
