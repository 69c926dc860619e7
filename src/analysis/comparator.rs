//! Singles-only vs combined comparison
//!
//! Standings rank every player of one model by conservative rating
//! (μ − 3σ, descending), then μ (descending), then player id (ascending),
//! which makes the rank a strict total order.

use crate::error::{DataError, Result};
use crate::rating::ModelResult;
use crate::types::{ModelKind, PlayerId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

/// A player's final position under one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player: PlayerId,
    pub mu: f64,
    pub sigma: f64,
    pub conservative: f64,
    /// 1-based
    pub rank: usize,
    /// Matches the player was rated in
    pub matches: usize,
}

/// Final-step differences for a player rated by both models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub player: PlayerId,
    pub singles_conservative: f64,
    pub combined_conservative: f64,
    /// μ(combined) − μ(singles)
    pub delta_mu: f64,
    /// σ(combined) − σ(singles)
    pub delta_sigma: f64,
    pub delta_conservative: f64,
    pub singles_rank: usize,
    pub combined_rank: usize,
    /// Positive when the player moves up with doubles included
    pub rank_change: i64,
}

/// Standings of both models plus the per-player comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub singles: Vec<Standing>,
    pub combined: Vec<Standing>,
    /// Ordered by singles rank
    pub records: Vec<ComparisonRecord>,
}

impl Comparison {
    pub fn standings(&self, kind: ModelKind) -> &[Standing] {
        match kind {
            ModelKind::SinglesOnly => &self.singles,
            ModelKind::Combined => &self.combined,
        }
    }

    pub fn record(&self, player: &str) -> Option<&ComparisonRecord> {
        self.records.iter().find(|r| r.player == player)
    }
}

/// Ordering used for ranks: better players first
pub fn rank_order(a: &Standing, b: &Standing) -> Ordering {
    b.conservative
        .total_cmp(&a.conservative)
        .then_with(|| b.mu.total_cmp(&a.mu))
        .then_with(|| a.player.cmp(&b.player))
}

/// Rank every player of one model by their final snapshot
pub fn standings(result: &ModelResult) -> Vec<Standing> {
    let mut standings: Vec<Standing> = result
        .histories()
        .filter_map(|(player, history)| {
            let last = history.last()?;
            let estimate = last.estimate();
            Some(Standing {
                player: player.clone(),
                mu: estimate.mu,
                sigma: estimate.sigma,
                conservative: estimate.conservative(),
                rank: 0,
                matches: history.len(),
            })
        })
        .collect();

    standings.sort_by(rank_order);
    for (index, standing) in standings.iter_mut().enumerate() {
        standing.rank = index + 1;
    }

    standings
}

/// Compare the singles-only result against the combined result.
///
/// Every singles match is part of the combined input, so a player rated by
/// the singles model but missing from the combined one is a data error.
pub fn compare(singles: &ModelResult, combined: &ModelResult) -> Result<Comparison> {
    if let Some(missing) = singles.players().find(|p| !combined.contains(p)) {
        return Err(DataError::MissingFromCombined {
            player: missing.clone(),
        }
        .into());
    }

    let singles_standings = standings(singles);
    let combined_standings = standings(combined);

    let combined_by_player: HashMap<&str, &Standing> = combined_standings
        .iter()
        .map(|s| (s.player.as_str(), s))
        .collect();

    let records: Vec<ComparisonRecord> = singles_standings
        .iter()
        .filter_map(|a| {
            let b = combined_by_player.get(a.player.as_str())?;
            Some(ComparisonRecord {
                player: a.player.clone(),
                singles_conservative: a.conservative,
                combined_conservative: b.conservative,
                delta_mu: b.mu - a.mu,
                delta_sigma: b.sigma - a.sigma,
                delta_conservative: b.conservative - a.conservative,
                singles_rank: a.rank,
                combined_rank: b.rank,
                rank_change: a.rank as i64 - b.rank as i64,
            })
        })
        .collect();

    let only_combined = combined_standings.len() - records.len();
    if only_combined > 0 {
        debug!(
            "{} players only appear in the combined model and get no comparison",
            only_combined
        );
    }
    info!(
        "Compared {} players ({} singles-only standings, {} combined standings)",
        records.len(),
        singles_standings.len(),
        combined_standings.len()
    );

    Ok(Comparison {
        singles: singles_standings,
        combined: combined_standings,
        records,
    })
}
