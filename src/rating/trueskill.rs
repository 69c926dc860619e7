//! TrueSkill inference with skill drift
//!
//! Each game is rated with the multi-team TrueSkill update from the
//! skillratings crate. Between a player's games their uncertainty grows
//! with the elapsed time, `σ² + γ²·Δt`, so long breaks let ratings move
//! again.

use crate::config::Hyperparameters;
use crate::rating::engine::{CurvePoint, Game, InferenceEngine, LearningCurves};
use crate::types::SkillEstimate;
use anyhow::bail;
use skillratings::trueskill::{trueskill_multi_team, TrueSkillConfig, TrueSkillRating};
use skillratings::MultiTeamOutcome;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Default chance of a shared placing
pub const DEFAULT_DRAW_PROBABILITY: f64 = 0.1;

/// Forward-filtered TrueSkill engine
#[derive(Debug, Clone)]
pub struct TrueSkillEngine {
    draw_probability: f64,
}

impl Default for TrueSkillEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DRAW_PROBABILITY)
    }
}

impl TrueSkillEngine {
    pub fn new(draw_probability: f64) -> Self {
        Self { draw_probability }
    }

    fn config(&self, params: &Hyperparameters) -> TrueSkillConfig {
        // Drift is applied per elapsed time below, not per game
        TrueSkillConfig {
            draw_probability: self.draw_probability,
            beta: params.beta,
            default_dynamics: 0.0,
        }
    }
}

/// Inflate uncertainty for the time since the player's previous game
pub fn apply_drift(estimate: SkillEstimate, gamma: f64, elapsed: f64) -> SkillEstimate {
    let elapsed = elapsed.max(0.0);
    SkillEstimate::new(
        estimate.mu,
        (estimate.sigma.powi(2) + gamma.powi(2) * elapsed).sqrt(),
    )
}

impl InferenceEngine for TrueSkillEngine {
    fn infer(
        &self,
        games: &[Game],
        params: &Hyperparameters,
    ) -> crate::error::Result<LearningCurves> {
        let config = self.config(params);
        let mut current: HashMap<&str, (SkillEstimate, f64)> = HashMap::new();
        let mut curves: LearningCurves = BTreeMap::new();

        for game in games {
            if game.teams.len() != game.ranks.len() {
                bail!(
                    "game at step {} has {} teams but {} ranks",
                    game.step,
                    game.teams.len(),
                    game.ranks.len()
                );
            }

            let priors: Vec<Vec<TrueSkillRating>> = game
                .teams
                .iter()
                .map(|team| {
                    team.iter()
                        .map(|player| match current.get(player.as_str()) {
                            Some((estimate, last_time)) => {
                                apply_drift(*estimate, params.gamma, game.time - last_time).into()
                            }
                            None => params.prior().into(),
                        })
                        .collect()
                })
                .collect();

            let teams_and_ranks: Vec<(&[TrueSkillRating], MultiTeamOutcome)> = priors
                .iter()
                .zip(&game.ranks)
                .map(|(team, rank)| (team.as_slice(), MultiTeamOutcome::new(*rank)))
                .collect();

            let posteriors = trueskill_multi_team(&teams_and_ranks, &config);
            if posteriors.len() != game.teams.len() {
                bail!(
                    "TrueSkill returned {} teams for step {}, expected {}",
                    posteriors.len(),
                    game.step,
                    game.teams.len()
                );
            }

            for (team, ratings) in game.teams.iter().zip(posteriors) {
                if ratings.len() != team.len() {
                    bail!("TrueSkill returned a malformed team at step {}", game.step);
                }

                for (player, rating) in team.iter().zip(ratings) {
                    let estimate = SkillEstimate::from(rating);
                    current.insert(player.as_str(), (estimate, game.time));
                    curves.entry(player.clone()).or_default().push(CurvePoint {
                        step: game.step,
                        time: game.time,
                        mu: estimate.mu,
                        sigma: estimate.sigma,
                    });
                }
            }

            debug!("Rated step {} ({} teams)", game.step, game.teams.len());
        }

        Ok(curves)
    }
}
