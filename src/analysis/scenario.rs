//! Results of one drift scenario
//!
//! A scenario runs both models with the same hyperparameters. When partial
//! results are allowed, one of the two runs may be missing.

use crate::analysis::comparator::{compare, standings, Comparison, Standing};
use crate::config::Hyperparameters;
use crate::error::Result;
use crate::rating::ModelResult;
use crate::types::ModelKind;
use serde::{Deserialize, Serialize};

/// Which model results a scenario carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Complete,
    SinglesOnly,
    CombinedOnly,
}

impl ScenarioStatus {
    pub fn is_partial(&self) -> bool {
        !matches!(self, ScenarioStatus::Complete)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub hyperparameters: Hyperparameters,
    pub singles: Option<ModelResult>,
    pub combined: Option<ModelResult>,
    /// Present only when both models ran
    pub comparison: Option<Comparison>,
    /// Why a model result is missing
    pub failure: Option<String>,
}

impl ScenarioOutcome {
    /// Both models ran; compares them
    pub fn complete(
        hyperparameters: Hyperparameters,
        singles: ModelResult,
        combined: ModelResult,
    ) -> Result<Self> {
        let comparison = compare(&singles, &combined)?;
        Ok(Self {
            hyperparameters,
            singles: Some(singles),
            combined: Some(combined),
            comparison: Some(comparison),
            failure: None,
        })
    }

    /// Only `kept` ran; the other model failed with `failure`
    pub fn partial(hyperparameters: Hyperparameters, kept: ModelResult, failure: String) -> Self {
        let (singles, combined) = match kept.kind {
            ModelKind::SinglesOnly => (Some(kept), None),
            ModelKind::Combined => (None, Some(kept)),
        };
        Self {
            hyperparameters,
            singles,
            combined,
            comparison: None,
            failure: Some(failure),
        }
    }

    pub fn status(&self) -> ScenarioStatus {
        match (&self.singles, &self.combined) {
            (Some(_), None) => ScenarioStatus::SinglesOnly,
            (None, Some(_)) => ScenarioStatus::CombinedOnly,
            _ => ScenarioStatus::Complete,
        }
    }

    pub fn result(&self, kind: ModelKind) -> Option<&ModelResult> {
        match kind {
            ModelKind::SinglesOnly => self.singles.as_ref(),
            ModelKind::Combined => self.combined.as_ref(),
        }
    }

    /// Ranked standings of one model, empty if that model did not run
    pub fn standings(&self, kind: ModelKind) -> Vec<Standing> {
        match (&self.comparison, self.result(kind)) {
            (Some(comparison), _) => comparison.standings(kind).to_vec(),
            (None, Some(result)) => standings(result),
            (None, None) => Vec::new(),
        }
    }
}
