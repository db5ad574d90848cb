//! LogSift Core
//!
//! Core types and utilities shared across LogSift components.
//!
//! This crate provides:
//! - The `(source, message)` input unit and labeled output unit
//! - Strategy provenance recording
//! - Error types and result handling
//! - Tabular ingestion and the delimited export contract

pub mod error;
pub mod export;
pub mod types;

pub use error::{Error, Result};
pub use types::{LabeledEntry, LogEntry, Strategy, UNCLASSIFIED};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{LabeledEntry, LogEntry, Strategy, UNCLASSIFIED};
}
