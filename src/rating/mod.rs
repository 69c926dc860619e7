//! Rating inference
//!
//! This module defines the inference interface, the TrueSkill engine built
//! on the skillratings crate, and the runner/extractor pair that turns a
//! match table into per-player rating histories for one model.

pub mod engine;
pub mod history;
pub mod runner;
pub mod trueskill;

// Re-export commonly used types
pub use engine::{CurvePoint, Game, InferenceEngine, LearningCurves};
pub use history::{extract_history, ModelResult};
pub use runner::{ModelRunner, RunOutput};
pub use trueskill::TrueSkillEngine;
