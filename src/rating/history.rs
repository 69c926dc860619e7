//! History extraction
//!
//! Turns an engine's learning curves into a neutral per-player sequence of
//! rating snapshots, dated from the match table.

use crate::config::Hyperparameters;
use crate::error::{PipelineError, Result};
use crate::rating::runner::RunOutput;
use crate::types::{Match, ModelKind, PlayerId, RatingSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// All snapshots of one model run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub kind: ModelKind,
    pub hyperparameters: Hyperparameters,
    histories: BTreeMap<PlayerId, Vec<RatingSnapshot>>,
}

impl ModelResult {
    pub fn new(
        kind: ModelKind,
        hyperparameters: Hyperparameters,
        histories: BTreeMap<PlayerId, Vec<RatingSnapshot>>,
    ) -> Self {
        Self {
            kind,
            hyperparameters,
            histories,
        }
    }

    /// Ordered snapshots of one player
    pub fn history(&self, player: &str) -> Option<&[RatingSnapshot]> {
        self.histories.get(player).map(Vec::as_slice)
    }

    /// Snapshot after the player's last match
    pub fn final_snapshot(&self, player: &str) -> Option<&RatingSnapshot> {
        self.histories.get(player).and_then(|h| h.last())
    }

    pub fn contains(&self, player: &str) -> bool {
        self.histories.contains_key(player)
    }

    /// Players in id order
    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.histories.keys()
    }

    pub fn histories(&self) -> impl Iterator<Item = (&PlayerId, &[RatingSnapshot])> {
        self.histories.iter().map(|(p, h)| (p, h.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

/// Convert a run's learning curves into a [`ModelResult`].
///
/// `matches` must be the full match table the run was built from; steps
/// index into it. Players without points are left out.
pub fn extract_history(output: RunOutput, matches: &[Match]) -> Result<ModelResult> {
    let RunOutput {
        kind,
        hyperparameters,
        curves,
    } = output;

    let mut histories = BTreeMap::new();
    for (player, mut points) in curves {
        if points.is_empty() {
            debug!("{} model has no points for '{}', omitting", kind, player);
            continue;
        }

        points.sort_by_key(|point| point.step);

        let mut snapshots = Vec::with_capacity(points.len());
        for point in points {
            let date = matches
                .get(point.step)
                .filter(|m| m.step == point.step)
                .map(|m| m.date)
                .ok_or_else(|| PipelineError::Inference {
                    model: kind,
                    reason: format!("step {} is not in the match table", point.step),
                })?;

            snapshots.push(RatingSnapshot {
                player: player.clone(),
                step: point.step,
                date,
                mu: point.mu,
                sigma: point.sigma,
            });
        }

        histories.insert(player, snapshots);
    }

    Ok(ModelResult::new(kind, hyperparameters, histories))
}
