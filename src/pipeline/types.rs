//! Row types for the three datasets
//!
//! Counts are `i64` so that out-of-range values survive parsing and are
//! rejected by validation with a proper reason.

use super::frame::{Cell, Record};

/// One team's line in the league table
#[derive(Debug, Clone, PartialEq)]
pub struct StandingsRow {
    pub rank: i64,
    pub team: String,
    pub points: i64,
    pub played: i64,
    pub wins: i64,
    pub draws: i64,
    pub losses: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub goal_difference: i64,
}

impl Record for StandingsRow {
    const COLUMNS: &'static [&'static str] = &[
        "rank",
        "team",
        "points",
        "played",
        "wins",
        "draws",
        "losses",
        "goals_for",
        "goals_against",
        "goal_difference",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.rank),
            Cell::Text(self.team.clone()),
            Cell::Int(self.points),
            Cell::Int(self.played),
            Cell::Int(self.wins),
            Cell::Int(self.draws),
            Cell::Int(self.losses),
            Cell::Int(self.goals_for),
            Cell::Int(self.goals_against),
            Cell::Int(self.goal_difference),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScorerRow {
    pub player: String,
    pub team: String,
    pub goals: i64,
    pub appearances: i64,
}

impl Record for ScorerRow {
    const COLUMNS: &'static [&'static str] = &["player", "team", "goals", "appearances"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.player.clone()),
            Cell::Text(self.team.clone()),
            Cell::Int(self.goals),
            Cell::Int(self.appearances),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistRow {
    pub player: String,
    pub team: String,
    pub assists: i64,
    pub appearances: i64,
}

impl Record for AssistRow {
    const COLUMNS: &'static [&'static str] = &["player", "team", "assists", "appearances"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.player.clone()),
            Cell::Text(self.team.clone()),
            Cell::Int(self.assists),
            Cell::Int(self.appearances),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::Frame;

    #[test]
    fn test_standings_columns_line_up() {
        let row = StandingsRow {
            rank: 1,
            team: "Liverpool".to_string(),
            points: 84,
            played: 38,
            wins: 25,
            draws: 9,
            losses: 4,
            goals_for: 86,
            goals_against: 41,
            goal_difference: 45,
        };
        let frame = Frame::from_records(&[row]);

        assert_eq!(frame.columns().len(), row_len::<StandingsRow>());
        assert_eq!(frame.int_column("goal_difference").unwrap(), vec![45]);
        assert_eq!(frame.text_column("team").unwrap(), vec!["Liverpool"]);
    }

    #[test]
    fn test_player_rows() {
        let scorers = Frame::from_records(&[ScorerRow {
            player: "Mohamed Salah".to_string(),
            team: "Liverpool".to_string(),
            goals: 29,
            appearances: 38,
        }]);
        assert_eq!(scorers.int_column("goals").unwrap(), vec![29]);

        let assists = Frame::from_records(&[AssistRow {
            player: "Mohamed Salah".to_string(),
            team: "Liverpool".to_string(),
            assists: 18,
            appearances: 38,
        }]);
        assert_eq!(assists.int_column("assists").unwrap(), vec![18]);
        assert_eq!(assists.text_column("player").unwrap(), vec!["Mohamed Salah"]);
    }

    fn row_len<R: Record>() -> usize {
        R::COLUMNS.len()
    }
}
