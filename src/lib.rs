// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod decision;
pub mod engine;
pub mod features;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod risk;
pub mod severity;
pub mod store;
pub mod weather;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::features::compute_indices;
pub use crate::monitor::{Monitor, MonitorParts};
pub use crate::risk::classify;
pub use crate::severity::SeverityPredictor;
