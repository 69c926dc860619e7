//! Configuration management for skill-curves
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values for the pipeline.

pub mod app;
pub mod input;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ExportSettings, PipelineSettings, ServiceSettings};
pub use input::{ColumnNames, InputSettings};
pub use rating::{Hyperparameters, ModelSettings, TimeScale};
