//! VisionProxy Core Library
//!
//! Domain models, the eligibility rule, error types and configuration shared by
//! the database, processing and API crates.

pub mod config;
pub mod constants;
pub mod eligibility;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, CaptionConfig, ClipConfig, Config, PipelineConfig};
pub use eligibility::{evaluate, reading_budget_seconds, Eligibility};
pub use error::{
    AppError, ErrorMetadata, ExtractionError, InferenceError, LogLevel, PersistenceError,
};
