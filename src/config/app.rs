//! Main application configuration
//!
//! This module defines the primary configuration structures for skill-curves,
//! including TOML/environment loading and validation.

use crate::config::input::InputSettings;
use crate::config::rating::{Hyperparameters, ModelSettings};
use crate::error::PipelineError;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub input: InputSettings,
    pub model: ModelSettings,
    pub pipeline: PipelineSettings,
    pub export: ExportSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Name used in the log banner
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Pipeline orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Drift values to run; each one produces a scenario with both models
    pub gammas: Vec<f64>,
    /// Scenario shown first and used for player selection; defaults to the first gamma
    pub reference_gamma: Option<f64>,
    /// Export a labelled partial scenario when one of the two runs fails
    pub allow_partial: bool,
    /// Run the two models of a scenario concurrently
    pub parallel_runs: bool,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Output path; `.json` writes the bare dataset, anything else an HTML page
    pub path: String,
    pub title: String,
    /// Number of players kept in the export, 0 keeps everyone
    pub top_n: usize,
    /// Curves with fewer points are left out of the chart data
    pub min_curve_points: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "skill-curves".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            gammas: vec![Hyperparameters::default().gamma],
            reference_gamma: None,
            allow_partial: false,
            parallel_runs: false,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            path: "skill_curves.html".to_string(),
            title: "Singles Only vs Singles + Doubles".to_string(),
            top_n: 100,
            min_curve_points: 1,
        }
    }
}

impl PipelineSettings {
    /// The gamma of the default scenario
    pub fn reference_gamma(&self) -> f64 {
        self.reference_gamma
            .or_else(|| self.gammas.first().copied())
            .unwrap_or(Hyperparameters::default().gamma)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse a TOML document. Without an explicit `pipeline.gammas` list the
    /// only scenario is the model section's gamma.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(raw)?;
        let sets_gammas = table
            .get("pipeline")
            .and_then(|pipeline| pipeline.get("gammas"))
            .is_some();

        let mut config: AppConfig = toml::from_str(raw)?;
        if !sets_gammas {
            config.pipeline.gammas = vec![config.model.gamma];
        }
        Ok(config)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Input / output
        if let Ok(path) = env::var("SKILL_CURVES_INPUT") {
            self.input.path = Some(path);
        }
        if let Ok(path) = env::var("SKILL_CURVES_OUTPUT") {
            self.export.path = path;
        }

        // Model settings
        if let Ok(gamma) = env::var("MODEL_GAMMA") {
            self.model.gamma = parse_var("MODEL_GAMMA", &gamma)?;
            self.pipeline.gammas = vec![self.model.gamma];
            self.pipeline.reference_gamma = None;
        }
        if let Ok(sigma) = env::var("MODEL_SIGMA") {
            self.model.sigma = parse_var("MODEL_SIGMA", &sigma)?;
        }
        if let Ok(beta) = env::var("MODEL_BETA") {
            self.model.beta = parse_var("MODEL_BETA", &beta)?;
        }
        if let Ok(mu) = env::var("MODEL_MU") {
            self.model.mu = parse_var("MODEL_MU", &mu)?;
        }
        if let Ok(draw) = env::var("DRAW_PROBABILITY") {
            self.model.draw_probability = parse_var("DRAW_PROBABILITY", &draw)?;
        }

        // Pipeline / export settings
        if let Ok(top_n) = env::var("TOP_N") {
            self.export.top_n = parse_var("TOP_N", &top_n)?;
        }
        if let Ok(allow) = env::var("ALLOW_PARTIAL") {
            self.pipeline.allow_partial = parse_var("ALLOW_PARTIAL", &allow)?;
        }
        if let Ok(parallel) = env::var("PARALLEL_RUNS") {
            self.pipeline.parallel_runs = parse_var("PARALLEL_RUNS", &parallel)?;
        }

        Ok(())
    }

    /// Hyperparameters for every configured scenario, in configured order
    pub fn scenarios(&self) -> Vec<Hyperparameters> {
        let base = self.model.hyperparameters();
        self.pipeline
            .gammas
            .iter()
            .map(|gamma| base.with_gamma(*gamma))
            .collect()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    check_config(config).map_err(|e| {
        PipelineError::Configuration {
            message: e.to_string(),
        }
        .into()
    })
}

fn check_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate model settings
    if !(config.model.sigma > 0.0) {
        return Err(anyhow!("Prior sigma must be positive"));
    }
    if !(config.model.beta > 0.0) {
        return Err(anyhow!("Beta must be positive"));
    }
    if !config.model.mu.is_finite() {
        return Err(anyhow!("Prior mu must be finite"));
    }
    if !(0.0..1.0).contains(&config.model.draw_probability) {
        return Err(anyhow!("Draw probability must be in [0, 1)"));
    }

    // Validate scenarios
    if config.pipeline.gammas.is_empty() {
        return Err(anyhow!("At least one gamma value is required"));
    }
    if let Some(bad) = config
        .pipeline
        .gammas
        .iter()
        .find(|gamma| !gamma.is_finite() || **gamma < 0.0)
    {
        return Err(anyhow!("Gamma must be non-negative, got {}", bad));
    }
    let reference = config.pipeline.reference_gamma();
    if !config.pipeline.gammas.contains(&reference) {
        return Err(anyhow!(
            "Reference gamma {} is not one of the configured gammas",
            reference
        ));
    }

    // Validate input columns
    if config
        .input
        .columns
        .required()
        .iter()
        .any(|column| column.trim().is_empty())
    {
        return Err(anyhow!("Input column names cannot be empty"));
    }

    if config.export.path.is_empty() {
        return Err(anyhow!("Output path cannot be empty"));
    }

    Ok(())
}
