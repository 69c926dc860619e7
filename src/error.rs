//! Error types for the rating pipeline
//!
//! Typed errors are defined with thiserror and propagated through anyhow,
//! so callers can downcast to find out which stage failed.

use crate::types::ModelKind;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Malformed or incomplete input. Always aborts before any model run.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Failed to read input: {message}")]
    Unreadable { message: String },

    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    #[error("Row {row}: missing value for {field}")]
    MissingField { row: usize, field: String },

    #[error("Row {row}: invalid {field} value '{value}'")]
    InvalidField {
        row: usize,
        field: String,
        value: String,
    },

    #[error("Match '{event}' has {teams} team(s), at least 2 are required")]
    TooFewTeams { event: String, teams: usize },

    #[error("Player '{player}' appears more than once in match '{event}'")]
    DuplicateParticipant { player: String, event: String },

    #[error("Player '{player}' is rated by the singles model but missing from the combined model")]
    MissingFromCombined { player: String },
}

/// Pipeline-level failures
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Inference failed for {model} model: {reason}")]
    Inference { model: ModelKind, reason: String },

    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}
