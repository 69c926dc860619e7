//! Match record loading
//!
//! Reads the tournament results CSV into a validated, chronologically
//! ordered table of matches. Any malformed row aborts the load.

pub mod grouping;
pub mod records;

pub use grouping::group_matches;
pub use records::{read_rows, ResultRow};

use crate::config::InputSettings;
use crate::error::{DataError, Result};
use crate::types::{GameType, Match};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Loads match tables from results files
#[derive(Debug, Clone)]
pub struct MatchLoader {
    settings: InputSettings,
}

impl MatchLoader {
    pub fn new(settings: InputSettings) -> Self {
        Self { settings }
    }

    /// Load and validate the results file at `path`
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Match>> {
        let path = path.as_ref();
        info!("Loading match results from {}", path.display());

        let file = File::open(path).map_err(|e| DataError::Unreadable {
            message: format!("{}: {}", path.display(), e),
        })?;
        self.load(file)
    }

    /// Load and validate results from any reader
    pub fn load<R: Read>(&self, reader: R) -> Result<Vec<Match>> {
        let rows = read_rows(reader, &self.settings)?;
        debug!("Read {} result rows", rows.len());

        let matches = group_matches(rows)?;
        let singles = matches
            .iter()
            .filter(|m| m.game_type == GameType::Singles)
            .count();
        info!(
            "Loaded {} matches ({} singles, {} doubles)",
            matches.len(),
            singles,
            matches.len() - singles
        );

        Ok(matches)
    }
}
