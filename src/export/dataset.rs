//! Export dataset
//!
//! The dataset is the only thing the rendered page consumes. Every map is
//! ordered, so serializing the same results always yields the same bytes.

use crate::analysis::{
    align, build_timeline, ComparisonRecord, ScenarioOutcome, ScenarioStatus, Standing,
    TimelineEntry,
};
use crate::config::{ExportSettings, Hyperparameters};
use crate::error::{PipelineError, Result};
use crate::types::{Match, ModelKind, PlayerId, RatingSnapshot, Step};
use crate::utils::gamma_key;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDataset {
    pub title: String,
    /// Input file name
    pub source: String,
    pub match_count: usize,
    pub player_count: usize,
    pub default_scenario: String,
    pub timeline: Vec<TimelineEntry>,
    /// Selected players, sorted by name
    pub players: Vec<PlayerId>,
    pub scenarios: BTreeMap<String, ScenarioExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioExport {
    pub hyperparameters: Hyperparameters,
    pub status: ScenarioStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub players: BTreeMap<PlayerId, PlayerExport>,
    pub comparisons: Vec<ComparisonRecord>,
}

/// One player under both models of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerExport {
    pub singles: Option<ModelExport>,
    pub combined: Option<ModelExport>,
    /// Conservative gap between the models at steps both rated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divergence: Option<Divergence>,
}

/// Standing and curve of one player under one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelExport {
    pub rank: usize,
    pub final_mu: f64,
    pub final_sigma: f64,
    pub conservative: f64,
    pub matches: usize,
    /// Dropped when shorter than the configured minimum
    pub curve: Option<CurveExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveExport {
    pub steps: Vec<Step>,
    pub dates: Vec<NaiveDate>,
    pub mu: Vec<f64>,
    pub sigma: Vec<f64>,
}

impl CurveExport {
    fn from_history(history: &[RatingSnapshot]) -> Self {
        Self {
            steps: history.iter().map(|s| s.step).collect(),
            dates: history.iter().map(|s| s.date).collect(),
            mu: history.iter().map(|s| s.mu).collect(),
            sigma: history.iter().map(|s| s.sigma).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub steps: Vec<Step>,
    /// Conservative(combined) − conservative(singles)
    pub delta_conservative: Vec<f64>,
}

/// Assembles an [`ExportDataset`] from scenario outcomes
#[derive(Debug)]
pub struct DatasetBuilder<'a> {
    settings: &'a ExportSettings,
    source: String,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(settings: &'a ExportSettings, source: impl Into<String>) -> Self {
        Self {
            settings,
            source: source.into(),
        }
    }

    pub fn build(
        &self,
        matches: &[Match],
        outcomes: &[ScenarioOutcome],
        reference_gamma: f64,
    ) -> Result<ExportDataset> {
        let default_scenario = gamma_key(reference_gamma);
        let reference = outcomes
            .iter()
            .find(|o| gamma_key(o.hyperparameters.gamma) == default_scenario)
            .ok_or_else(|| PipelineError::Export {
                message: format!("no results for reference gamma {}", default_scenario),
            })?;

        let players = select_players(reference, self.settings.top_n);
        let player_count = matches
            .iter()
            .flat_map(Match::participants)
            .collect::<BTreeSet<_>>()
            .len();

        let mut scenarios = BTreeMap::new();
        for outcome in outcomes {
            let key = gamma_key(outcome.hyperparameters.gamma);
            let scenario = self.scenario(outcome, &players);
            if scenario.status.is_partial() {
                warn!(
                    "Scenario gamma={} is exported partially ({:?})",
                    key, scenario.status
                );
            }
            scenarios.insert(key, scenario);
        }

        info!(
            "Built export dataset: {} scenarios, {} of {} players selected",
            scenarios.len(),
            players.len(),
            player_count
        );

        Ok(ExportDataset {
            title: self.settings.title.clone(),
            source: self.source.clone(),
            match_count: matches.len(),
            player_count,
            default_scenario,
            timeline: build_timeline(matches),
            players,
            scenarios,
        })
    }

    fn scenario(&self, outcome: &ScenarioOutcome, players: &[PlayerId]) -> ScenarioExport {
        let singles = standings_by_player(outcome.standings(ModelKind::SinglesOnly));
        let combined = standings_by_player(outcome.standings(ModelKind::Combined));

        let mut exports = BTreeMap::new();
        for player in players {
            let singles_history = outcome
                .result(ModelKind::SinglesOnly)
                .and_then(|r| r.history(player));
            let combined_history = outcome
                .result(ModelKind::Combined)
                .and_then(|r| r.history(player));

            let divergence = match (singles_history, combined_history) {
                (Some(a), Some(b)) => Some(divergence(a, b)),
                _ => None,
            };

            exports.insert(
                player.clone(),
                PlayerExport {
                    singles: self.model_export(singles.get(player.as_str()), singles_history),
                    combined: self.model_export(combined.get(player.as_str()), combined_history),
                    divergence,
                },
            );
        }

        let selected: BTreeSet<&str> = players.iter().map(String::as_str).collect();
        let comparisons = outcome
            .comparison
            .as_ref()
            .map(|c| {
                c.records
                    .iter()
                    .filter(|r| selected.contains(r.player.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        ScenarioExport {
            hyperparameters: outcome.hyperparameters,
            status: outcome.status(),
            failure: outcome.failure.clone(),
            players: exports,
            comparisons,
        }
    }

    fn model_export(
        &self,
        standing: Option<&Standing>,
        history: Option<&[RatingSnapshot]>,
    ) -> Option<ModelExport> {
        let standing = standing?;
        let curve = history
            .map(CurveExport::from_history)
            .filter(|curve| !curve.is_empty() && curve.len() >= self.settings.min_curve_points);
        if curve.is_none() {
            debug!("Dropping short curve for '{}'", standing.player);
        }

        Some(ModelExport {
            rank: standing.rank,
            final_mu: standing.mu,
            final_sigma: standing.sigma,
            conservative: standing.conservative,
            matches: standing.matches,
            curve,
        })
    }
}

fn standings_by_player(standings: Vec<Standing>) -> HashMap<String, Standing> {
    standings
        .into_iter()
        .map(|s| (s.player.clone(), s))
        .collect()
}

fn divergence(singles: &[RatingSnapshot], combined: &[RatingSnapshot]) -> Divergence {
    let (steps, delta_conservative) = align(singles, combined)
        .into_iter()
        .filter_map(|point| {
            let a = point.singles?;
            let b = point.combined?;
            Some((point.step, b.conservative() - a.conservative()))
        })
        .unzip();

    Divergence {
        steps,
        delta_conservative,
    }
}

/// Keep the `top_n` players by the better of their two conservative
/// ratings (0 keeps everyone), returned sorted by name
pub fn select_players(reference: &ScenarioOutcome, top_n: usize) -> Vec<PlayerId> {
    let mut best: BTreeMap<PlayerId, f64> = BTreeMap::new();
    for kind in [ModelKind::SinglesOnly, ModelKind::Combined] {
        for standing in reference.standings(kind) {
            best.entry(standing.player)
                .and_modify(|score| *score = score.max(standing.conservative))
                .or_insert(standing.conservative);
        }
    }

    let mut ranked: Vec<(PlayerId, f64)> = best.into_iter().collect();
    ranked.sort_by(|(a, x), (b, y)| y.total_cmp(x).then_with(|| a.cmp(b)));
    if top_n > 0 {
        ranked.truncate(top_n);
    }

    let mut players: Vec<PlayerId> = ranked.into_iter().map(|(player, _)| player).collect();
    players.sort();
    players
}
