//! CSV rows of the results file
//!
//! One row is one participant's placing in one event. Rows are validated
//! here; grouping them into matches happens in [`super::grouping`].

use crate::config::{ColumnNames, InputSettings};
use crate::error::{DataError, Result};
use crate::types::GameType;
use crate::utils::parse_date;
use chrono::NaiveDate;
use csv::StringRecord;
use std::io::Read;

/// A validated results row
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    /// Line in the source file, for error messages
    pub line: usize,
    pub season: Option<String>,
    pub event: String,
    pub date: NaiveDate,
    pub game_type: GameType,
    pub player: String,
    pub place: u32,
    pub team: Option<String>,
}

/// Header positions of the configured columns
struct ColumnIndex {
    date: usize,
    event: usize,
    game_type: usize,
    player: usize,
    place: usize,
    season: Option<usize>,
    team: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, columns: &ColumnNames) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|header| header.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| DataError::MissingColumn {
                column: name.to_string(),
            })
        };

        Ok(Self {
            date: require(&columns.date)?,
            event: require(&columns.event)?,
            game_type: require(&columns.game_type)?,
            player: require(&columns.player)?,
            place: require(&columns.place)?,
            season: find(&columns.season),
            team: find(&columns.team),
        })
    }
}

/// Read and validate every row of a results CSV
pub fn read_rows<R: Read>(reader: R, settings: &InputSettings) -> Result<Vec<ResultRow>> {
    let delimiter = u8::try_from(settings.delimiter).map_err(|_| DataError::Unreadable {
        message: format!("delimiter '{}' is not a single byte", settings.delimiter),
    })?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| DataError::Unreadable {
            message: e.to_string(),
        })?
        .clone();
    let index = ColumnIndex::resolve(&headers, &settings.columns)?;

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| DataError::Unreadable {
            message: e.to_string(),
        })?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 2);

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        rows.push(parse_row(&record, line, &index, settings)?);
    }

    Ok(rows)
}

fn parse_row(
    record: &StringRecord,
    line: usize,
    index: &ColumnIndex,
    settings: &InputSettings,
) -> Result<ResultRow> {
    let columns = &settings.columns;
    let required = |position: usize, name: &str| -> std::result::Result<String, DataError> {
        match record.get(position) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(DataError::MissingField {
                row: line,
                field: name.to_string(),
            }),
        }
    };
    let optional = |position: Option<usize>| {
        position
            .and_then(|p| record.get(p))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let raw_date = required(index.date, &columns.date)?;
    let date = parse_date(&raw_date, &settings.date_format).ok_or_else(|| {
        DataError::InvalidField {
            row: line,
            field: columns.date.clone(),
            value: raw_date.clone(),
        }
    })?;

    let raw_type = required(index.game_type, &columns.game_type)?;
    let game_type = GameType::parse(&raw_type).ok_or_else(|| DataError::InvalidField {
        row: line,
        field: columns.game_type.clone(),
        value: raw_type.clone(),
    })?;

    let raw_place = required(index.place, &columns.place)?;
    let place = parse_place(&raw_place).ok_or_else(|| DataError::InvalidField {
        row: line,
        field: columns.place.clone(),
        value: raw_place.clone(),
    })?;

    Ok(ResultRow {
        line,
        season: optional(index.season),
        event: required(index.event, &columns.event)?,
        date,
        game_type,
        player: required(index.player, &columns.player)?,
        place,
        team: optional(index.team),
    })
}

/// Placings are positive integers; spreadsheets sometimes export them as `3.0`
fn parse_place(value: &str) -> Option<u32> {
    if let Ok(place) = value.parse::<u32>() {
        return (place > 0).then_some(place);
    }

    let place = value.parse::<f64>().ok()?;
    if place.fract() == 0.0 && place >= 1.0 && place <= u32::MAX as f64 {
        Some(place as u32)
    } else {
        None
    }
}
