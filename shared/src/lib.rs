//! HealthWise Shared Library
//!
//! Lab report data model, result classification, aggregation, backup
//! codec and validation shared by the backend and the WASM module.

pub mod aggregator;
pub mod backup;
pub mod classifier;
pub mod errors;
pub mod health_metrics;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::*;
pub use types::*;
