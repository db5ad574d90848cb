//! LogSift Router
//!
//! The orchestration layer: per-entry strategy selection driven by source
//! policies, batch execution over a bounded worker pool, and the single
//! configuration surface that wires rules, policies, thresholds, and the
//! generative call budget together.

pub mod batch;
pub mod config;
pub mod router;

pub use config::RouterConfig;
pub use router::Router;
