//! Core types and pure functions for monster-ecology.
//!
//! Holds the canonical row model, the field normalizers that turn loosely
//! typed statblock records into it, small statistics helpers, formatting and
//! CLI settings. Nothing here performs network or terminal I/O.

pub mod error;
pub mod formatting;
pub mod models;
pub mod normalize;
pub mod settings;
pub mod stats;
