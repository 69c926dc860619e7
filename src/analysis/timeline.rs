//! Common timeline
//!
//! Both models index their snapshots by the step of the shared match
//! table, so the table itself is the axis both histories align on.

use crate::types::{GameType, Match, RatingSnapshot, SkillEstimate, Step};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One step of the shared axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub step: Step,
    pub date: NaiveDate,
    pub event: String,
    pub game_type: GameType,
}

pub fn build_timeline(matches: &[Match]) -> Vec<TimelineEntry> {
    matches
        .iter()
        .map(|m| TimelineEntry {
            step: m.step,
            date: m.date,
            event: m.event.clone(),
            game_type: m.game_type,
        })
        .collect()
}

/// A player's two estimates at one step, where each model has one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPoint {
    pub step: Step,
    pub singles: Option<SkillEstimate>,
    pub combined: Option<SkillEstimate>,
}

/// Merge two step-ordered histories of the same player onto one axis
pub fn align(singles: &[RatingSnapshot], combined: &[RatingSnapshot]) -> Vec<AlignedPoint> {
    let mut aligned = Vec::with_capacity(singles.len().max(combined.len()));
    let mut a = singles.iter().peekable();
    let mut b = combined.iter().peekable();

    loop {
        let point = match (a.peek(), b.peek()) {
            (None, None) => break,
            (Some(x), Some(y)) if x.step == y.step => AlignedPoint {
                step: x.step,
                singles: a.next().map(RatingSnapshot::estimate),
                combined: b.next().map(RatingSnapshot::estimate),
            },
            (Some(x), Some(y)) if x.step < y.step => AlignedPoint {
                step: x.step,
                singles: a.next().map(RatingSnapshot::estimate),
                combined: None,
            },
            (Some(x), None) => AlignedPoint {
                step: x.step,
                singles: a.next().map(RatingSnapshot::estimate),
                combined: None,
            },
            (_, Some(y)) => AlignedPoint {
                step: y.step,
                singles: None,
                combined: b.next().map(RatingSnapshot::estimate),
            },
        };
        aligned.push(point);
    }

    aligned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(step: Step, mu: f64) -> RatingSnapshot {
        RatingSnapshot {
            player: "p".to_string(),
            step,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            mu,
            sigma: 1.0,
        }
    }

    #[test]
    fn test_timeline_follows_match_table() {
        let matches: Vec<Match> = (0..3)
            .map(|step| Match {
                step,
                date: NaiveDate::from_ymd_opt(2024, 1, 1 + step as u32).unwrap(),
                event: format!("S1 E{}", step),
                game_type: if step == 1 {
                    GameType::Doubles
                } else {
                    GameType::Singles
                },
                teams: vec![],
                ranks: vec![],
            })
            .collect();

        let timeline = build_timeline(&matches);
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[1].game_type, GameType::Doubles);
        assert_eq!(timeline[2].event, "S1 E2");
    }

    #[test]
    fn test_align_merges_by_step() {
        let singles = vec![snapshot(0, 1.0), snapshot(3, 2.0)];
        let combined = vec![snapshot(0, 1.1), snapshot(2, 1.5), snapshot(3, 2.1)];

        let aligned = align(&singles, &combined);
        let steps: Vec<Step> = aligned.iter().map(|p| p.step).collect();
        assert_eq!(steps, vec![0, 2, 3]);

        assert_eq!(aligned[0].singles.unwrap().mu, 1.0);
        assert_eq!(aligned[0].combined.unwrap().mu, 1.1);
        assert!(aligned[1].singles.is_none());
        assert_eq!(aligned[1].combined.unwrap().mu, 1.5);
        assert_eq!(aligned[2].singles.unwrap().mu, 2.0);
    }

    #[test]
    fn test_align_one_sided() {
        let combined = vec![snapshot(4, 0.5)];
        let aligned = align(&[], &combined);
        assert_eq!(aligned.len(), 1);
        assert!(aligned[0].singles.is_none());
    }
}
