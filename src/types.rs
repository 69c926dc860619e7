//! Common types used throughout the rating pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillRating;

/// Unique identifier for players (the name as it appears in the results)
pub type PlayerId = String;

/// Roster of one team in a match
pub type Team = Vec<PlayerId>;

/// Position of a match in the chronologically ordered match table
pub type Step = usize;

/// Kind of event a match was played in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Singles,
    Doubles,
}

impl GameType {
    /// Parse the game type column, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "singles" | "single" | "s" => Some(GameType::Singles),
            "doubles" | "double" | "d" => Some(GameType::Doubles),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameType::Singles => write!(f, "Singles"),
            GameType::Doubles => write!(f, "Doubles"),
        }
    }
}

/// The two model configurations that get compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Only one-vs-one matches
    SinglesOnly,
    /// Singles and doubles matches together
    Combined,
}

impl ModelKind {
    /// Whether a match of the given type is part of this model's input
    pub fn includes(&self, game_type: GameType) -> bool {
        match self {
            ModelKind::SinglesOnly => game_type == GameType::Singles,
            ModelKind::Combined => true,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::SinglesOnly => write!(f, "singles-only"),
            ModelKind::Combined => write!(f, "combined"),
        }
    }
}

/// One tournament event: teams and the order they finished in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub step: Step,
    pub date: NaiveDate,
    pub event: String,
    pub game_type: GameType,
    pub teams: Vec<Team>,
    /// Rank per team, 1 = best; equal ranks share a placing
    pub ranks: Vec<usize>,
}

impl Match {
    /// All players taking part, in team order
    pub fn participants(&self) -> impl Iterator<Item = &PlayerId> {
        self.teams.iter().flatten()
    }

    pub fn contains(&self, player: &str) -> bool {
        self.participants().any(|p| p == player)
    }
}

/// Posterior belief about a player's skill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillEstimate {
    pub mu: f64,
    pub sigma: f64,
}

impl SkillEstimate {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    /// Lower confidence bound used for ranking: μ − 3σ
    pub fn conservative(&self) -> f64 {
        self.mu - 3.0 * self.sigma
    }

    pub fn is_valid(&self) -> bool {
        self.mu.is_finite() && self.sigma.is_finite() && self.sigma >= 0.0
    }
}

impl From<TrueSkillRating> for SkillEstimate {
    fn from(rating: TrueSkillRating) -> Self {
        Self {
            mu: rating.rating,
            sigma: rating.uncertainty,
        }
    }
}

impl From<SkillEstimate> for TrueSkillRating {
    fn from(estimate: SkillEstimate) -> Self {
        Self {
            rating: estimate.mu,
            uncertainty: estimate.sigma,
        }
    }
}

/// A player's rating after one match under one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub player: PlayerId,
    pub step: Step,
    pub date: NaiveDate,
    pub mu: f64,
    pub sigma: f64,
}

impl RatingSnapshot {
    pub fn estimate(&self) -> SkillEstimate {
        SkillEstimate::new(self.mu, self.sigma)
    }
}
