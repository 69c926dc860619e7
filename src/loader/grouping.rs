//! Grouping of result rows into matches

use super::records::ResultRow;
use crate::error::{DataError, Result};
use crate::types::{GameType, Match, Team};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Rows belong to the same match when all of these agree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EventKey {
    season: Option<String>,
    event: String,
    date: NaiveDate,
    game_type: GameType,
}

impl EventKey {
    fn of(row: &ResultRow) -> Self {
        Self {
            season: row.season.clone(),
            event: row.event.clone(),
            date: row.date,
            game_type: row.game_type,
        }
    }
}

/// Build the chronologically ordered match table.
///
/// Events keep the order of their first row; the date sort is stable, so
/// events on the same day stay in input order. Steps are assigned after sorting.
pub fn group_matches(rows: Vec<ResultRow>) -> Result<Vec<Match>> {
    let mut order: Vec<EventKey> = Vec::new();
    let mut groups: HashMap<EventKey, Vec<ResultRow>> = HashMap::new();

    for row in rows {
        let key = EventKey::of(&row);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row);
    }

    let mut matches = Vec::with_capacity(order.len());
    for key in order {
        let rows = groups.remove(&key).unwrap_or_default();
        matches.push(build_match(key, rows)?);
    }

    matches.sort_by_key(|m| m.date);
    for (step, m) in matches.iter_mut().enumerate() {
        m.step = step;
    }

    Ok(matches)
}

fn build_match(key: EventKey, mut rows: Vec<ResultRow>) -> Result<Match> {
    rows.sort_by_key(|row| row.place);

    let placed_teams: Vec<(u32, Team)> = match key.game_type {
        GameType::Singles => rows
            .into_iter()
            .map(|row| (row.place, vec![row.player]))
            .collect(),
        GameType::Doubles => {
            if rows.iter().all(|row| row.team.is_some()) {
                teams_by_column(rows)?
            } else {
                teams_by_placing(rows)
            }
        }
    };

    let event = match &key.season {
        Some(season) => format!("{} {}", season, key.event),
        None => key.event.clone(),
    };

    let mut seen = HashSet::new();
    for (_, team) in &placed_teams {
        for player in team {
            if !seen.insert(player.as_str()) {
                return Err(DataError::DuplicateParticipant {
                    player: player.clone(),
                    event,
                }
                .into());
            }
        }
    }

    if placed_teams.len() < 2 {
        return Err(DataError::TooFewTeams {
            event,
            teams: placed_teams.len(),
        }
        .into());
    }

    let ranks = dense_ranks(&placed_teams);
    let teams = placed_teams.into_iter().map(|(_, team)| team).collect();

    Ok(Match {
        step: 0,
        date: key.date,
        event,
        game_type: key.game_type,
        teams,
        ranks,
    })
}

/// Partners share a team id and must share a placing
fn teams_by_column(rows: Vec<ResultRow>) -> Result<Vec<(u32, Team)>> {
    let mut order: Vec<String> = Vec::new();
    let mut teams: HashMap<String, (u32, Team)> = HashMap::new();

    for row in rows {
        let id = row.team.unwrap_or_default();
        match teams.get_mut(&id) {
            Some((place, _)) if *place != row.place => {
                return Err(DataError::InvalidField {
                    row: row.line,
                    field: "place".to_string(),
                    value: row.place.to_string(),
                }
                .into());
            }
            Some((_, team)) => team.push(row.player),
            None => {
                order.push(id.clone());
                teams.insert(id, (row.place, vec![row.player]));
            }
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|id| teams.remove(&id))
        .collect())
}

/// Without a team column, consecutive rows sharing a placing are partners.
/// A row left without a partner plays as a one-player team.
fn teams_by_placing(rows: Vec<ResultRow>) -> Vec<(u32, Team)> {
    let mut teams = Vec::new();
    let mut rows = rows.into_iter().peekable();

    while let Some(row) = rows.next() {
        match rows.next_if(|next| next.place == row.place) {
            Some(partner) => teams.push((row.place, vec![row.player, partner.player])),
            None => teams.push((row.place, vec![row.player])),
        }
    }

    teams
}

/// 1 for the best placing; teams with equal placings share a rank
fn dense_ranks(teams: &[(u32, Team)]) -> Vec<usize> {
    let mut places: Vec<u32> = teams.iter().map(|(place, _)| *place).collect();
    places.sort_unstable();
    places.dedup();

    teams
        .iter()
        .map(|(place, _)| places.partition_point(|p| p < place) + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(event: &str, day: u32, game_type: GameType, player: &str, place: u32) -> ResultRow {
        ResultRow {
            line: 0,
            season: None,
            event: event.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            game_type,
            player: player.to_string(),
            place,
            team: None,
        }
    }

    #[test]
    fn test_singles_grouping_and_ranks() {
        let matches = group_matches(vec![
            row("Open", 1, GameType::Singles, "Carol", 3),
            row("Open", 1, GameType::Singles, "Alice", 1),
            row("Open", 1, GameType::Singles, "Bob", 2),
            row("Open", 1, GameType::Singles, "Dave", 3),
        ])
        .unwrap();

        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(
            m.teams,
            vec![
                vec!["Alice".to_string()],
                vec!["Bob".to_string()],
                vec!["Carol".to_string()],
                vec!["Dave".to_string()],
            ]
        );
        assert_eq!(m.ranks, vec![1, 2, 3, 3]);
    }

    #[test]
    fn test_doubles_paired_by_placing() {
        let matches = group_matches(vec![
            row("Pairs", 2, GameType::Doubles, "Alice", 1),
            row("Pairs", 2, GameType::Doubles, "Carol", 1),
            row("Pairs", 2, GameType::Doubles, "Bob", 2),
            row("Pairs", 2, GameType::Doubles, "Dave", 2),
            row("Pairs", 2, GameType::Doubles, "Erin", 3),
        ])
        .unwrap();

        let m = &matches[0];
        assert_eq!(m.teams.len(), 3);
        assert_eq!(m.teams[0], vec!["Alice".to_string(), "Carol".to_string()]);
        assert_eq!(m.teams[1], vec!["Bob".to_string(), "Dave".to_string()]);
        assert_eq!(m.teams[2], vec!["Erin".to_string()]);
        assert_eq!(m.ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_doubles_team_column() {
        let mut rows = vec![
            row("Pairs", 2, GameType::Doubles, "Alice", 1),
            row("Pairs", 2, GameType::Doubles, "Bob", 2),
            row("Pairs", 2, GameType::Doubles, "Carol", 1),
            row("Pairs", 2, GameType::Doubles, "Dave", 2),
        ];
        for (r, team) in rows.iter_mut().zip(["A", "B", "A", "B"]) {
            r.team = Some(team.to_string());
        }

        let matches = group_matches(rows).unwrap();
        let m = &matches[0];
        assert_eq!(m.teams[0], vec!["Alice".to_string(), "Carol".to_string()]);
        assert_eq!(m.teams[1], vec!["Bob".to_string(), "Dave".to_string()]);
    }

    #[test]
    fn test_team_column_partners_must_share_placing() {
        let mut rows = vec![
            row("Pairs", 2, GameType::Doubles, "Alice", 1),
            row("Pairs", 2, GameType::Doubles, "Bob", 2),
            row("Pairs", 2, GameType::Doubles, "Carol", 3),
            row("Pairs", 2, GameType::Doubles, "Dave", 2),
        ];
        for ((r, team), line) in rows.iter_mut().zip(["A", "B", "A", "B"]).zip(2..) {
            r.team = Some(team.to_string());
            r.line = line;
        }

        let error = group_matches(rows)
            .unwrap_err()
            .downcast::<DataError>()
            .unwrap();
        // Carol's row (line 4) disagrees with Alice's placing
        assert!(matches!(
            error,
            DataError::InvalidField { row: 4, ref field, ref value } if field == "place" && value == "3"
        ));
    }

    #[test]
    fn test_stable_chronological_order() {
        let matches = group_matches(vec![
            row("Late", 9, GameType::Singles, "Alice", 1),
            row("Late", 9, GameType::Singles, "Bob", 2),
            row("Second", 3, GameType::Singles, "Alice", 1),
            row("Second", 3, GameType::Singles, "Bob", 2),
            row("Third", 3, GameType::Singles, "Bob", 1),
            row("Third", 3, GameType::Singles, "Alice", 2),
            row("First", 1, GameType::Singles, "Carol", 1),
            row("First", 1, GameType::Singles, "Bob", 2),
        ])
        .unwrap();

        let events: Vec<&str> = matches.iter().map(|m| m.event.as_str()).collect();
        assert_eq!(events, vec!["First", "Second", "Third", "Late"]);
        let steps: Vec<usize> = matches.iter().map(|m| m.step).collect();
        assert_eq!(steps, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_season_separates_events() {
        let mut rows = vec![
            row("Open", 1, GameType::Singles, "Alice", 1),
            row("Open", 1, GameType::Singles, "Bob", 2),
            row("Open", 1, GameType::Singles, "Carol", 1),
            row("Open", 1, GameType::Singles, "Dave", 2),
        ];
        rows[0].season = Some("2023".to_string());
        rows[1].season = Some("2023".to_string());
        rows[2].season = Some("2024".to_string());
        rows[3].season = Some("2024".to_string());

        let matches = group_matches(rows).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].event, "2023 Open");
        assert_eq!(matches[1].event, "2024 Open");
    }

    #[test]
    fn test_single_team_match_rejected() {
        let error = group_matches(vec![row("Solo", 1, GameType::Singles, "Alice", 1)])
            .unwrap_err()
            .downcast::<DataError>()
            .unwrap();
        assert!(matches!(error, DataError::TooFewTeams { teams: 1, .. }));

        // A lone doubles pair is still only one team
        let error = group_matches(vec![
            row("Pairs", 1, GameType::Doubles, "Alice", 1),
            row("Pairs", 1, GameType::Doubles, "Bob", 1),
        ])
        .unwrap_err()
        .downcast::<DataError>()
        .unwrap();
        assert!(matches!(error, DataError::TooFewTeams { teams: 1, .. }));
    }

    #[test]
    fn test_duplicate_participant_rejected() {
        let error = group_matches(vec![
            row("Open", 1, GameType::Singles, "Alice", 1),
            row("Open", 1, GameType::Singles, "Alice", 2),
        ])
        .unwrap_err()
        .downcast::<DataError>()
        .unwrap();
        assert!(matches!(error, DataError::DuplicateParticipant { player, .. } if player == "Alice"));
    }
}
