//! Runtime layer for monster-ecology.
//!
//! Talks to the paginated monsters API and turns its pages into an assembled
//! dataset.

pub mod fetcher;
pub mod source;

pub use ecology_core as core;
pub use ecology_data as data;
