//! Test fixtures for integration testing

#![allow(dead_code)]

use skill_curves::config::{AppConfig, Hyperparameters};
use skill_curves::error::Result;
use skill_curves::rating::{CurvePoint, Game, InferenceEngine, LearningCurves};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic engine: each player's mu is their running count of teams
/// beaten minus teams lost to, sigma shrinks with games played
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    fail_on_doubles: bool,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every run that contains a doubles game
    pub fn failing_on_doubles() -> Self {
        Self {
            fail_on_doubles: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceEngine for ScriptedEngine {
    fn infer(&self, games: &[Game], params: &Hyperparameters) -> Result<LearningCurves> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_on_doubles && games.iter().any(|g| g.teams.iter().any(|t| t.len() > 1)) {
            anyhow::bail!("scripted failure on doubles");
        }

        let mut curves = LearningCurves::new();
        for game in games {
            for (team, rank) in game.teams.iter().zip(&game.ranks) {
                let beaten = game.ranks.iter().filter(|r| *r > rank).count() as f64;
                let lost_to = game.ranks.iter().filter(|r| *r < rank).count() as f64;

                for player in team {
                    let points = curves.entry(player.clone()).or_default();
                    let previous = points.last().map(|p| p.mu).unwrap_or(params.mu);
                    let played = points.len() as f64 + 1.0;
                    points.push(CurvePoint {
                        step: game.step,
                        time: game.time,
                        mu: previous + beaten - lost_to,
                        sigma: params.sigma / played,
                    });
                }
            }
        }

        Ok(curves)
    }
}

/// One results row: season, event, date, type, player, place
pub type Row<'a> = (&'a str, &'a str, &'a str, &'a str, &'a str, u32);

/// Build a results CSV with the default column names
pub fn results_csv(rows: &[Row]) -> String {
    let mut csv = String::from("season,event,tournament_date,type,player,place\n");
    for (season, event, date, game_type, player, place) in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            season, event, date, game_type, player, place
        ));
    }
    csv
}

/// P1 beats P2 in singles, P1/P3 beat P2/P4 in doubles, P2 beats P1 in singles
pub fn three_match_csv() -> String {
    results_csv(&[
        ("2024", "Open A", "2024-01-01", "Singles", "P1", 1),
        ("2024", "Open A", "2024-01-01", "Singles", "P2", 2),
        ("2024", "Pairs", "2024-01-02", "Doubles", "P1", 1),
        ("2024", "Pairs", "2024-01-02", "Doubles", "P3", 1),
        ("2024", "Pairs", "2024-01-02", "Doubles", "P2", 2),
        ("2024", "Pairs", "2024-01-02", "Doubles", "P4", 2),
        ("2024", "Open B", "2024-01-03", "Singles", "P2", 1),
        ("2024", "Open B", "2024-01-03", "Singles", "P1", 2),
    ])
}

pub fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("failed to write test input");
    path
}

/// Default configuration exporting every player
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.export.top_n = 0;
    config
}
