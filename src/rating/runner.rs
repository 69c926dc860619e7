//! Model runner
//!
//! Filters the match table for one model, converts it to engine games and
//! validates what the engine returns. A failing run is reported as an
//! inference error for that model; runs are never retried.

use crate::config::{Hyperparameters, TimeScale};
use crate::error::{PipelineError, Result};
use crate::rating::engine::{Game, InferenceEngine, LearningCurves};
use crate::types::{Match, ModelKind, SkillEstimate, Step};
use crate::utils::days_since_epoch;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Validated engine output for one model
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub kind: ModelKind,
    pub hyperparameters: Hyperparameters,
    pub curves: LearningCurves,
}

/// Runs one model configuration through an inference engine
#[derive(Clone)]
pub struct ModelRunner {
    engine: Arc<dyn InferenceEngine>,
    time_scale: TimeScale,
}

impl std::fmt::Debug for ModelRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRunner")
            .field("time_scale", &self.time_scale)
            .finish_non_exhaustive()
    }
}

impl ModelRunner {
    pub fn new(engine: Arc<dyn InferenceEngine>, time_scale: TimeScale) -> Self {
        Self { engine, time_scale }
    }

    /// Games for `kind`, in match-table order
    pub fn games_for(&self, kind: ModelKind, matches: &[Match]) -> Vec<Game> {
        matches
            .iter()
            .filter(|m| kind.includes(m.game_type))
            .map(|m| Game {
                step: m.step,
                time: match self.time_scale {
                    TimeScale::Days => days_since_epoch(m.date),
                    TimeScale::Steps => m.step as f64,
                },
                teams: m.teams.clone(),
                ranks: m.ranks.clone(),
            })
            .collect()
    }

    /// Run the model over its share of `matches`
    pub fn run(
        &self,
        kind: ModelKind,
        matches: &[Match],
        params: &Hyperparameters,
    ) -> Result<RunOutput> {
        let games = self.games_for(kind, matches);
        if games.is_empty() {
            warn!("No matches for the {} model", kind);
        }
        info!(
            "Running {} model over {} matches (gamma={}, sigma={}, beta={})",
            kind,
            games.len(),
            params.gamma,
            params.sigma,
            params.beta
        );

        let curves = self
            .engine
            .infer(&games, params)
            .map_err(|e| PipelineError::Inference {
                model: kind,
                reason: format!("{:#}", e),
            })?;

        validate_curves(kind, &games, &curves)?;
        info!("{} model rated {} players", kind, curves.len());

        Ok(RunOutput {
            kind,
            hyperparameters: *params,
            curves,
        })
    }
}

/// Every point must be a finite posterior at a step the player actually played
fn validate_curves(kind: ModelKind, games: &[Game], curves: &LearningCurves) -> Result<()> {
    let played: HashSet<(Step, &str)> = games
        .iter()
        .flat_map(|g| g.teams.iter().flatten().map(move |p| (g.step, p.as_str())))
        .collect();

    let fail = |reason: String| PipelineError::Inference {
        model: kind,
        reason,
    };

    for (player, points) in curves {
        let mut steps = HashSet::new();
        for point in points {
            if !SkillEstimate::new(point.mu, point.sigma).is_valid() {
                return Err(fail(format!(
                    "non-finite or negative posterior for '{}' at step {} (mu={}, sigma={})",
                    player, point.step, point.mu, point.sigma
                ))
                .into());
            }
            if !played.contains(&(point.step, player.as_str())) {
                return Err(fail(format!(
                    "'{}' has a point at step {} but did not play there",
                    player, point.step
                ))
                .into());
            }
            if !steps.insert(point.step) {
                return Err(fail(format!(
                    "'{}' has more than one point at step {}",
                    player, point.step
                ))
                .into());
            }
        }
    }

    Ok(())
}
