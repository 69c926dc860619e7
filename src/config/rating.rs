//! Rating model configuration

use crate::types::SkillEstimate;
use serde::{Deserialize, Serialize};

/// Unit in which elapsed time between a player's matches is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    /// Calendar days between match dates
    #[default]
    Days,
    /// Number of matches between the two appearances
    Steps,
}

/// Hyperparameters handed to the inference engine for one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Prior mean
    pub mu: f64,
    /// Prior uncertainty
    pub sigma: f64,
    /// Performance noise
    pub beta: f64,
    /// Skill drift per unit of time
    pub gamma: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            mu: 0.0,
            sigma: 1.667,
            beta: 1.0,
            gamma: 0.03,
        }
    }
}

impl Hyperparameters {
    /// Belief about a player that has not played yet
    pub fn prior(&self) -> SkillEstimate {
        SkillEstimate::new(self.mu, self.sigma)
    }

    pub fn with_gamma(self, gamma: f64) -> Self {
        Self { gamma, ..self }
    }
}

/// Model section of the application config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub mu: f64,
    pub sigma: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Probability of a shared placing, used by the TrueSkill update
    pub draw_probability: f64,
    pub time_scale: TimeScale,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let defaults = Hyperparameters::default();
        Self {
            mu: defaults.mu,
            sigma: defaults.sigma,
            beta: defaults.beta,
            gamma: defaults.gamma,
            draw_probability: 0.1,
            time_scale: TimeScale::Days,
        }
    }
}

impl ModelSettings {
    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            mu: self.mu,
            sigma: self.sigma,
            beta: self.beta,
            gamma: self.gamma,
        }
    }
}
