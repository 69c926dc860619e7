//! Skill Curves - singles-only vs singles+doubles rating comparison
//!
//! This crate loads tournament results, rates every player over time with
//! two models (singles matches only, and singles plus doubles), compares
//! the final ratings and exports the learning curves as a static page.

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod pipeline;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{DataError, PipelineError, Result};
pub use types::*;

// Re-export key components
pub use loader::MatchLoader;
pub use pipeline::{DataSummary, Pipeline, PipelineReport};
pub use rating::{InferenceEngine, TrueSkillEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
