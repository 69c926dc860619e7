//! Input file configuration

use serde::{Deserialize, Serialize};

/// Column names of the results CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub date: String,
    pub event: String,
    pub game_type: String,
    pub player: String,
    pub place: String,
    /// Optional; rows without it group only by event, date and type
    pub season: String,
    /// Optional; when present, doubles partners are matched by this column
    pub team: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "tournament_date".to_string(),
            event: "event".to_string(),
            game_type: "type".to_string(),
            player: "player".to_string(),
            place: "place".to_string(),
            season: "season".to_string(),
            team: "team".to_string(),
        }
    }
}

impl ColumnNames {
    /// Columns that must be present in the header
    pub fn required(&self) -> [&str; 5] {
        [
            self.date.as_str(),
            self.event.as_str(),
            self.game_type.as_str(),
            self.player.as_str(),
            self.place.as_str(),
        ]
    }
}

/// Input section of the application config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Results CSV path
    pub path: Option<String>,
    pub columns: ColumnNames,
    /// chrono format tried before the built-in fallbacks
    pub date_format: String,
    pub delimiter: char,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            path: None,
            columns: ColumnNames::default(),
            date_format: "%Y-%m-%d".to_string(),
            delimiter: ',',
        }
    }
}
