//! End-to-end comparison pipeline
//!
//! load → run both models per scenario → extract → compare → export.
//! Data errors abort before any model run. Inference errors abort unless
//! partial results are allowed, in which case a scenario with one
//! surviving model is exported and labelled as such.

use crate::analysis::{ScenarioOutcome, ScenarioStatus};
use crate::config::{validate_config, AppConfig, Hyperparameters};
use crate::error::{PipelineError, Result};
use crate::export::{write_dataset, DatasetBuilder, ExportDataset};
use crate::loader::MatchLoader;
use crate::rating::{extract_history, InferenceEngine, ModelRunner, RunOutput, TrueSkillEngine};
use crate::types::{GameType, Match, ModelKind};
use crate::utils::gamma_key;
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub matches: usize,
    pub players: usize,
    pub scenarios: BTreeMap<String, ScenarioStatus>,
    pub output: PathBuf,
}

impl PipelineReport {
    pub fn is_partial(&self) -> bool {
        self.scenarios.values().any(ScenarioStatus::is_partial)
    }
}

/// Overview of a loaded match table, used for dry runs
#[derive(Debug, Clone, PartialEq)]
pub struct DataSummary {
    pub matches: usize,
    pub singles: usize,
    pub doubles: usize,
    pub players: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl DataSummary {
    pub fn from_matches(matches: &[Match]) -> Self {
        let singles = matches
            .iter()
            .filter(|m| m.game_type == GameType::Singles)
            .count();
        Self {
            matches: matches.len(),
            singles,
            doubles: matches.len() - singles,
            players: matches
                .iter()
                .flat_map(Match::participants)
                .collect::<BTreeSet<_>>()
                .len(),
            first_date: matches.first().map(|m| m.date),
            last_date: matches.last().map(|m| m.date),
        }
    }
}

/// Runs the comparison for one configuration
pub struct Pipeline {
    config: AppConfig,
    engine: Arc<dyn InferenceEngine>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline backed by the TrueSkill engine
    pub fn new(config: AppConfig) -> Self {
        let engine = Arc::new(TrueSkillEngine::new(config.model.draw_probability));
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: AppConfig, engine: Arc<dyn InferenceEngine>) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn runner(&self) -> ModelRunner {
        ModelRunner::new(self.engine.clone(), self.config.model.time_scale)
    }

    /// Load and validate the match table
    pub fn load(&self, input: &Path) -> Result<Vec<Match>> {
        MatchLoader::new(self.config.input.clone()).load_path(input)
    }

    /// Load the input and describe it without running any model
    pub fn summarize(&self, input: &Path) -> Result<DataSummary> {
        validate_config(&self.config)?;
        let matches = self.load(input)?;
        Ok(DataSummary::from_matches(&matches))
    }

    /// Run every scenario, one model at a time
    pub fn run_scenarios(&self, matches: &[Match]) -> Result<Vec<ScenarioOutcome>> {
        let runner = self.runner();
        let mut outcomes = Vec::new();

        for params in self.config.scenarios() {
            let singles = match runner.run(ModelKind::SinglesOnly, matches, &params) {
                Err(e) if !self.config.pipeline.allow_partial => return Err(e),
                other => other,
            };
            let combined = runner.run(ModelKind::Combined, matches, &params);
            outcomes.push(self.combine(params, singles, combined, matches)?);
        }

        Ok(outcomes)
    }

    /// Run every scenario with both model runs in parallel on the blocking pool
    pub async fn run_scenarios_parallel(
        &self,
        matches: Arc<Vec<Match>>,
    ) -> Result<Vec<ScenarioOutcome>> {
        let runner = self.runner();
        let mut outcomes = Vec::new();

        for params in self.config.scenarios() {
            let singles = {
                let runner = runner.clone();
                let matches = matches.clone();
                tokio::task::spawn_blocking(move || {
                    runner.run(ModelKind::SinglesOnly, &matches, &params)
                })
            };
            let combined = {
                let runner = runner.clone();
                let matches = matches.clone();
                tokio::task::spawn_blocking(move || runner.run(ModelKind::Combined, &matches, &params))
            };

            let (singles, combined) = tokio::try_join!(singles, combined)
                .map_err(|e| anyhow!("Model run task failed: {}", e))?;
            outcomes.push(self.combine(params, singles, combined, &matches)?);
        }

        Ok(outcomes)
    }

    /// Turn the two runs of a scenario into its outcome
    fn combine(
        &self,
        params: Hyperparameters,
        singles: Result<RunOutput>,
        combined: Result<RunOutput>,
        matches: &[Match],
    ) -> Result<ScenarioOutcome> {
        let key = gamma_key(params.gamma);
        match (singles, combined) {
            (Ok(singles), Ok(combined)) => ScenarioOutcome::complete(
                params,
                extract_history(singles, matches)?,
                extract_history(combined, matches)?,
            ),
            (Err(e), Err(other)) => {
                error!("{:#}", other);
                Err(e.context(format!("Both models failed for gamma={}", key)))
            }
            (Ok(kept), Err(e)) | (Err(e), Ok(kept)) => {
                if !self.config.pipeline.allow_partial {
                    return Err(e);
                }
                warn!(
                    "Keeping only the {} model for gamma={}: {:#}",
                    kept.kind, key, e
                );
                Ok(ScenarioOutcome::partial(
                    params,
                    extract_history(kept, matches)?,
                    format!("{:#}", e),
                ))
            }
        }
    }

    /// Assemble the export dataset for finished scenarios
    pub fn build_dataset(
        &self,
        source: &str,
        matches: &[Match],
        outcomes: &[ScenarioOutcome],
    ) -> Result<ExportDataset> {
        DatasetBuilder::new(&self.config.export, source).build(
            matches,
            outcomes,
            self.config.pipeline.reference_gamma(),
        )
    }

    /// Run the whole pipeline synchronously and write the artifact to `output`
    pub fn execute(&self, input: &Path, output: &Path) -> Result<PipelineReport> {
        validate_config(&self.config)?;
        let matches = self.load(input)?;
        let outcomes = self.run_scenarios(&matches)?;
        self.finish(input, output, &matches, &outcomes)
    }

    /// Like [`Pipeline::execute`], running model pairs in parallel when configured
    pub async fn execute_async(&self, input: &Path, output: &Path) -> Result<PipelineReport> {
        if !self.config.pipeline.parallel_runs {
            return self.execute(input, output);
        }

        validate_config(&self.config)?;
        let matches = Arc::new(self.load(input)?);
        let outcomes = self.run_scenarios_parallel(matches.clone()).await?;
        self.finish(input, output, &matches, &outcomes)
    }

    fn finish(
        &self,
        input: &Path,
        output: &Path,
        matches: &[Match],
        outcomes: &[ScenarioOutcome],
    ) -> Result<PipelineReport> {
        let source = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let dataset = self.build_dataset(&source, matches, outcomes)?;
        write_dataset(&dataset, output)
            .with_context(|| format!("Failed to export to {}", output.display()))?;

        let scenarios: BTreeMap<String, ScenarioStatus> = dataset
            .scenarios
            .iter()
            .map(|(key, scenario)| (key.clone(), scenario.status))
            .collect();
        let report = PipelineReport {
            matches: dataset.match_count,
            players: dataset.player_count,
            scenarios,
            output: output.to_path_buf(),
        };

        if report.is_partial() {
            warn!("Export contains partial scenarios");
        }
        info!(
            "Exported {} scenarios for {} players over {} matches",
            report.scenarios.len(),
            report.players,
            report.matches
        );

        Ok(report)
    }
}

/// Resolve where results go when no explicit output was given
pub fn output_path(config: &AppConfig) -> Result<PathBuf> {
    if config.export.path.trim().is_empty() {
        return Err(PipelineError::Configuration {
            message: "no output path configured".to_string(),
        }
        .into());
    }
    Ok(PathBuf::from(&config.export.path))
}

/// Resolve the input file from configuration
pub fn input_path(config: &AppConfig) -> Result<PathBuf> {
    config
        .input
        .path
        .as_deref()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            PipelineError::Configuration {
                message: "no input file given (use --input or SKILL_CURVES_INPUT)".to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::engine::{CurvePoint, MockInferenceEngine};
    use crate::rating::LearningCurves;

    fn matches() -> Vec<Match> {
        let m = |step: usize, game_type: GameType, teams: Vec<Vec<&str>>| Match {
            step,
            date: NaiveDate::from_ymd_opt(2024, 1, 1 + step as u32).unwrap(),
            event: format!("S1 E{}", step),
            game_type,
            ranks: vec![1, 2],
            teams: teams
                .into_iter()
                .map(|t| t.into_iter().map(str::to_string).collect())
                .collect(),
        };
        vec![
            m(0, GameType::Singles, vec![vec!["p1"], vec!["p2"]]),
            m(1, GameType::Doubles, vec![vec!["p1", "p3"], vec!["p2", "p4"]]),
        ]
    }

    /// One point per game played, mu = step
    fn echo_curves(games: &[crate::rating::Game]) -> LearningCurves {
        let mut curves = LearningCurves::new();
        for game in games {
            for player in game.teams.iter().flatten() {
                curves.entry(player.clone()).or_default().push(CurvePoint {
                    step: game.step,
                    time: game.time,
                    mu: game.step as f64,
                    sigma: 1.0,
                });
            }
        }
        curves
    }

    /// Engine that fails whenever it sees a doubles game
    fn failing_combined_engine() -> MockInferenceEngine {
        let mut engine = MockInferenceEngine::new();
        engine.expect_infer().returning(|games, _| {
            if games.iter().any(|g| g.teams[0].len() > 1) {
                Err(anyhow!("factor graph diverged"))
            } else {
                Ok(echo_curves(games))
            }
        });
        engine
    }

    #[test]
    fn test_complete_run() {
        let mut engine = MockInferenceEngine::new();
        engine
            .expect_infer()
            .times(2)
            .returning(|games, _| Ok(echo_curves(games)));

        let pipeline = Pipeline::with_engine(AppConfig::default(), Arc::new(engine));
        let outcomes = pipeline.run_scenarios(&matches()).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status(), ScenarioStatus::Complete);
        let comparison = outcomes[0].comparison.as_ref().unwrap();
        assert_eq!(comparison.records.len(), 2);
    }

    #[test]
    fn test_inference_failure_aborts_by_default() {
        let pipeline =
            Pipeline::with_engine(AppConfig::default(), Arc::new(failing_combined_engine()));
        let error = pipeline.run_scenarios(&matches()).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<PipelineError>(),
            Some(PipelineError::Inference {
                model: ModelKind::Combined,
                ..
            })
        ));
    }

    #[test]
    fn test_inference_failure_kept_partial_when_allowed() {
        let mut config = AppConfig::default();
        config.pipeline.allow_partial = true;

        let pipeline = Pipeline::with_engine(config, Arc::new(failing_combined_engine()));
        let outcomes = pipeline.run_scenarios(&matches()).unwrap();

        assert_eq!(outcomes[0].status(), ScenarioStatus::SinglesOnly);
        assert!(outcomes[0].comparison.is_none());
        assert!(outcomes[0].failure.as_ref().unwrap().contains("diverged"));
    }

    #[test]
    fn test_both_models_failing_aborts_even_when_partial_allowed() {
        let mut config = AppConfig::default();
        config.pipeline.allow_partial = true;

        let mut engine = MockInferenceEngine::new();
        engine
            .expect_infer()
            .returning(|_, _| Err(anyhow!("out of memory")));

        let pipeline = Pipeline::with_engine(config, Arc::new(engine));
        assert!(pipeline.run_scenarios(&matches()).is_err());
    }

    #[test]
    fn test_one_outcome_per_gamma() {
        let mut config = AppConfig::default();
        config.pipeline.gammas = vec![0.03, 0.015, 0.0075];

        let mut engine = MockInferenceEngine::new();
        engine
            .expect_infer()
            .times(6)
            .returning(|games, _| Ok(echo_curves(games)));

        let pipeline = Pipeline::with_engine(config, Arc::new(engine));
        let outcomes = pipeline.run_scenarios(&matches()).unwrap();
        let gammas: Vec<f64> = outcomes.iter().map(|o| o.hyperparameters.gamma).collect();
        assert_eq!(gammas, vec![0.03, 0.015, 0.0075]);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let mut config = AppConfig::default();
        config.pipeline.gammas = vec![0.03, 0.015];

        let pipeline = Pipeline::new(config);
        let matches = matches();
        let sequential = pipeline.run_scenarios(&matches).unwrap();
        let parallel = pipeline
            .run_scenarios_parallel(Arc::new(matches))
            .await
            .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_summary() {
        let summary = DataSummary::from_matches(&matches());
        assert_eq!(summary.matches, 2);
        assert_eq!(summary.singles, 1);
        assert_eq!(summary.doubles, 1);
        assert_eq!(summary.players, 4);
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_missing_input_is_configuration_error() {
        let error = input_path(&AppConfig::default()).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<PipelineError>(),
            Some(PipelineError::Configuration { .. })
        ));
    }
}
