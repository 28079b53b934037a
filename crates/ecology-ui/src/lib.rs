//! Terminal UI layer for monster-ecology.
//!
//! Provides themes, the summary-table view and a tabbed viewer event loop
//! built on [`ratatui`].

pub mod app;
pub mod table_view;
pub mod themes;

pub use ecology_core as core;
