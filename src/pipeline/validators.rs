//! Data-quality checks run before anything is written
//!
//! `validate_*` return a plain pass/fail and log the reason. The `check_*`
//! variants return the first failed check as a [`ValidationError`].

use super::frame::{Frame, FrameError};
use std::collections::HashSet;
use thiserror::Error;

/// Teams in a full Premier League table
pub const EXPECTED_TEAMS: usize = 20;

pub const STANDINGS_REQUIRED_COLUMNS: &[&str] =
    &["rank", "team", "points", "played", "wins", "draws", "losses"];
pub const SCORERS_REQUIRED_COLUMNS: &[&str] = &["player", "team", "goals", "appearances"];
pub const ASSISTS_REQUIRED_COLUMNS: &[&str] = &["player", "team", "assists", "appearances"];

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("missing required columns: {0:?}")]
    MissingColumns(Vec<String>),
    #[error("{0} data is empty")]
    Empty(&'static str),
    #[error("duplicate teams found in standings: {0:?}")]
    DuplicateTeams(Vec<String>),
    #[error("negative {column} found in rows {rows:?}")]
    Negative { column: &'static str, rows: Vec<usize> },
    #[error("points calculation mismatch for {0:?}")]
    PointsMismatch(Vec<String>),
    #[error("games played calculation mismatch for {0:?}")]
    PlayedMismatch(Vec<String>),
    #[error("invalid appearances in rows {0:?}")]
    NonPositiveAppearances(Vec<usize>),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub fn validate_standings(frame: &Frame) -> bool {
    report("Standings", "teams", frame, check_standings(frame))
}

pub fn validate_top_scorers(frame: &Frame) -> bool {
    report("Top scorers", "players", frame, check_top_scorers(frame))
}

pub fn validate_top_assists(frame: &Frame) -> bool {
    report("Top assists", "players", frame, check_top_assists(frame))
}

fn report(label: &str, unit: &str, frame: &Frame, result: Result<(), ValidationError>) -> bool {
    match result {
        Ok(()) => {
            log::info!("✓ {} validation passed: {} {}", label, frame.len(), unit);
            true
        }
        Err(e) => {
            log::error!("{} validation failed: {}", label, e);
            false
        }
    }
}

/// League table checks
///
/// - every team appears once
/// - no negative points
/// - `points == wins * 3 + draws`
/// - `played == wins + draws + losses`
///
/// A table that is not exactly [`EXPECTED_TEAMS`] long only warns.
pub fn check_standings(frame: &Frame) -> Result<(), ValidationError> {
    require_columns(frame, STANDINGS_REQUIRED_COLUMNS)?;

    if frame.len() != EXPECTED_TEAMS {
        log::warn!("Expected {} teams, got {}", EXPECTED_TEAMS, frame.len());
    }

    let teams = frame.text_column("team")?;
    let duplicates = duplicates(&teams);
    if !duplicates.is_empty() {
        return Err(ValidationError::DuplicateTeams(duplicates));
    }

    let points = frame.int_column("points")?;
    let negative = negative_rows(&points);
    if !negative.is_empty() {
        return Err(ValidationError::Negative {
            column: "points",
            rows: negative,
        });
    }

    let played = frame.int_column("played")?;
    let wins = frame.int_column("wins")?;
    let draws = frame.int_column("draws")?;
    let losses = frame.int_column("losses")?;

    let points_mismatch: Vec<String> = (0..frame.len())
        .filter(|&i| {
            wins[i]
                .checked_mul(3)
                .and_then(|w| w.checked_add(draws[i]))
                != Some(points[i])
        })
        .map(|i| teams[i].to_string())
        .collect();
    if !points_mismatch.is_empty() {
        return Err(ValidationError::PointsMismatch(points_mismatch));
    }

    let played_mismatch: Vec<String> = (0..frame.len())
        .filter(|&i| {
            wins[i]
                .checked_add(draws[i])
                .and_then(|n| n.checked_add(losses[i]))
                != Some(played[i])
        })
        .map(|i| teams[i].to_string())
        .collect();
    if !played_mismatch.is_empty() {
        return Err(ValidationError::PlayedMismatch(played_mismatch));
    }

    Ok(())
}

pub fn check_top_scorers(frame: &Frame) -> Result<(), ValidationError> {
    check_player_table(frame, SCORERS_REQUIRED_COLUMNS, "goals", "top scorers")
}

pub fn check_top_assists(frame: &Frame) -> Result<(), ValidationError> {
    check_player_table(frame, ASSISTS_REQUIRED_COLUMNS, "assists", "top assists")
}

fn check_player_table(
    frame: &Frame,
    required: &[&str],
    metric: &'static str,
    dataset: &'static str,
) -> Result<(), ValidationError> {
    require_columns(frame, required)?;

    if frame.is_empty() {
        return Err(ValidationError::Empty(dataset));
    }

    let values = frame.int_column(metric)?;
    let negative = negative_rows(&values);
    if !negative.is_empty() {
        return Err(ValidationError::Negative {
            column: metric,
            rows: negative,
        });
    }

    let appearances = frame.int_column("appearances")?;
    let non_positive: Vec<usize> = appearances
        .iter()
        .enumerate()
        .filter(|(_, &apps)| apps <= 0)
        .map(|(i, _)| i)
        .collect();
    if !non_positive.is_empty() {
        return Err(ValidationError::NonPositiveAppearances(non_positive));
    }

    let players = frame.text_column("player")?;
    let duplicates = duplicates(&players);
    if !duplicates.is_empty() {
        log::warn!("Duplicate players found in {}: {:?}", dataset, duplicates);
    }

    Ok(())
}

fn require_columns(frame: &Frame, required: &[&str]) -> Result<(), ValidationError> {
    let missing = frame.missing_columns(required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingColumns(
            missing.into_iter().map(String::from).collect(),
        ))
    }
}

fn negative_rows(values: &[i64]) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v < 0)
        .map(|(i, _)| i)
        .collect()
}

/// Values that occur more than once, each reported once in first-seen order
fn duplicates(values: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut dups = Vec::new();
    for value in values {
        if !seen.insert(*value) && reported.insert(*value) {
            dups.push(value.to_string());
        }
    }
    dups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::Cell;
    use crate::pipeline::types::{AssistRow, ScorerRow, StandingsRow};

    fn standing(team: &str, points: i64, played: i64, w: i64, d: i64, l: i64) -> StandingsRow {
        StandingsRow {
            rank: 1,
            team: team.to_string(),
            points,
            played,
            wins: w,
            draws: d,
            losses: l,
            goals_for: 60,
            goals_against: 40,
            goal_difference: 20,
        }
    }

    fn valid_standings() -> Frame {
        Frame::from_records(&[
            standing("Liverpool", 84, 38, 25, 9, 4),
            standing("Arsenal", 74, 38, 20, 14, 4),
            standing("Man City", 71, 38, 21, 8, 9),
        ])
    }

    fn scorer(player: &str, goals: i64, appearances: i64) -> ScorerRow {
        ScorerRow {
            player: player.to_string(),
            team: "Liverpool".to_string(),
            goals,
            appearances,
        }
    }

    fn assist(player: &str, assists: i64, appearances: i64) -> AssistRow {
        AssistRow {
            player: player.to_string(),
            team: "Newcastle".to_string(),
            assists,
            appearances,
        }
    }

    #[test]
    fn test_valid_standings() {
        assert!(validate_standings(&valid_standings()));
    }

    #[test]
    fn test_single_consistent_row_passes() {
        let frame = Frame::from_records(&[standing("Liverpool", 84, 38, 25, 9, 4)]);
        assert!(validate_standings(&frame));
    }

    #[test]
    fn test_standings_missing_columns() {
        let mut frame = Frame::new(&["rank", "team"]);
        frame
            .push_row(vec![Cell::Int(1), Cell::from("Liverpool")])
            .unwrap();

        assert!(!validate_standings(&frame));
        assert_eq!(
            check_standings(&frame),
            Err(ValidationError::MissingColumns(vec![
                "points".to_string(),
                "played".to_string(),
                "wins".to_string(),
                "draws".to_string(),
                "losses".to_string(),
            ]))
        );
    }

    #[test]
    fn test_duplicate_teams() {
        let frame = Frame::from_records(&[
            standing("Liverpool", 84, 38, 25, 9, 4),
            standing("Liverpool", 74, 38, 20, 14, 4),
        ]);
        assert!(!validate_standings(&frame));
        assert_eq!(
            check_standings(&frame),
            Err(ValidationError::DuplicateTeams(vec!["Liverpool".to_string()]))
        );
    }

    #[test]
    fn test_negative_points() {
        let frame = Frame::from_records(&[standing("Liverpool", -10, 38, 0, 0, 38)]);
        assert_eq!(
            check_standings(&frame),
            Err(ValidationError::Negative {
                column: "points",
                rows: vec![0]
            })
        );
    }

    #[test]
    fn test_points_calculation() {
        let frame = Frame::from_records(&[
            standing("Arsenal", 74, 38, 20, 14, 4),
            standing("Liverpool", 100, 38, 25, 9, 4),
        ]);
        assert!(!validate_standings(&frame));
        assert_eq!(
            check_standings(&frame),
            Err(ValidationError::PointsMismatch(vec!["Liverpool".to_string()]))
        );
    }

    #[test]
    fn test_games_played_calculation() {
        let frame = Frame::from_records(&[standing("Liverpool", 84, 40, 25, 9, 4)]);
        assert_eq!(
            check_standings(&frame),
            Err(ValidationError::PlayedMismatch(vec!["Liverpool".to_string()]))
        );
    }

    #[test]
    fn test_overflowing_counts_fail_cleanly() {
        let frame = Frame::from_records(&[standing("Overflow FC", 84, 38, i64::MAX, 9, 4)]);
        assert!(!validate_standings(&frame));
    }

    #[test]
    fn test_wrong_cell_type_reported_not_panicking() {
        let mut frame = Frame::new(STANDINGS_REQUIRED_COLUMNS);
        frame
            .push_row(vec![
                Cell::Int(1),
                Cell::from("Liverpool"),
                Cell::from("84"),
                Cell::Int(38),
                Cell::Int(25),
                Cell::Int(9),
                Cell::Int(4),
            ])
            .unwrap();

        assert!(!validate_standings(&frame));
        assert!(matches!(
            check_standings(&frame),
            Err(ValidationError::Frame(FrameError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_empty_standings_frame() {
        assert!(!validate_standings(&Frame::default()));
    }

    #[test]
    fn test_valid_scorers() {
        let frame = Frame::from_records(&[
            scorer("Mohamed Salah", 29, 38),
            scorer("Erling Haaland", 22, 32),
            scorer("Alexander Isak", 23, 34),
        ]);
        assert!(validate_top_scorers(&frame));
    }

    #[test]
    fn test_scorers_missing_columns() {
        let mut frame = Frame::new(&["player", "goals"]);
        frame.push_row(vec![Cell::from("Salah"), Cell::Int(29)]).unwrap();
        assert!(!validate_top_scorers(&frame));
    }

    #[test]
    fn test_negative_goals_and_zero_appearances() {
        let frame = Frame::from_records(&[scorer("Mohamed Salah", -5, 0)]);
        assert!(!validate_top_scorers(&frame));
        assert_eq!(
            check_top_scorers(&frame),
            Err(ValidationError::Negative {
                column: "goals",
                rows: vec![0]
            })
        );

        let frame = Frame::from_records(&[scorer("Mohamed Salah", 5, 0)]);
        assert_eq!(
            check_top_scorers(&frame),
            Err(ValidationError::NonPositiveAppearances(vec![0]))
        );
    }

    #[test]
    fn test_empty_scorers() {
        assert!(!validate_top_scorers(&Frame::default()));
        assert_eq!(
            check_top_scorers(&Frame::from_records::<ScorerRow>(&[])),
            Err(ValidationError::Empty("top scorers"))
        );
    }

    #[test]
    fn test_duplicate_scorers_only_warn() {
        let frame = Frame::from_records(&[scorer("Salah", 29, 38), scorer("Salah", 29, 38)]);
        assert!(validate_top_scorers(&frame));
    }

    #[test]
    fn test_valid_assists() {
        let frame = Frame::from_records(&[
            assist("Mohamed Salah", 18, 38),
            assist("Alexander Isak", 11, 35),
            assist("Bruno Fernandes", 10, 37),
        ]);
        assert!(validate_top_assists(&frame));
    }

    #[test]
    fn test_assists_failures() {
        let mut frame = Frame::new(&["player", "assists"]);
        frame.push_row(vec![Cell::from("Salah"), Cell::Int(18)]).unwrap();
        assert!(!validate_top_assists(&frame));

        assert!(!validate_top_assists(&Frame::from_records(&[assist("Salah", -5, 38)])));
        assert!(!validate_top_assists(&Frame::from_records(&[assist("Salah", 18, 0)])));
        assert!(!validate_top_assists(&Frame::default()));
    }

    #[test]
    fn test_duplicates_helper() {
        assert_eq!(
            duplicates(&["a", "b", "a", "c", "b", "a"]),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(duplicates(&["a", "b"]).is_empty());
    }
}
