//! Inference engine interface
//!
//! The pipeline never updates ratings itself. It hands an ordered list of
//! games to an [`InferenceEngine`] and consumes the per-player learning
//! curves that come back.

use crate::config::Hyperparameters;
use crate::types::{PlayerId, Step, Team};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One match as seen by an engine
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub step: Step,
    /// Position on the drift time axis (days or steps, depending on config)
    pub time: f64,
    pub teams: Vec<Team>,
    /// Rank per team, 1 = best, equal ranks are shared placings
    pub ranks: Vec<usize>,
}

/// Posterior after one game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub step: Step,
    pub time: f64,
    pub mu: f64,
    pub sigma: f64,
}

/// Posterior trajectory of every participant, keyed by player
pub type LearningCurves = BTreeMap<PlayerId, Vec<CurvePoint>>;

/// Trait for rating inference over a sequence of games
#[cfg_attr(test, mockall::automock)]
pub trait InferenceEngine: Send + Sync {
    /// Run inference over `games` (in the given order) and return the
    /// posterior after every game each player took part in
    fn infer(
        &self,
        games: &[Game],
        params: &Hyperparameters,
    ) -> crate::error::Result<LearningCurves>;
}
