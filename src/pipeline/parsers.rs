//! Parsers from API-Football records to flat rows
//!
//! Each parser tolerates bad individual records (logged and skipped) but
//! fails with [`ParseError`] when the overall structure is missing or nothing
//! usable survives.

use super::types::{AssistRow, ScorerRow, StandingsRow};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("no {0} data received from API")]
    NoRecords(&'static str),
    #[error("invalid standings response: {0}")]
    InvalidStructure(&'static str),
    #[error("no valid {0} rows parsed")]
    NoValidRows(&'static str),
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

/// One entry of `league.standings[0]`
#[derive(Debug, Deserialize)]
struct StandingsEntry {
    rank: i64,
    team: Named,
    points: i64,
    all: MatchSplit,
    #[serde(rename = "goalsDiff")]
    goals_diff: i64,
}

#[derive(Debug, Deserialize)]
struct MatchSplit {
    played: i64,
    win: i64,
    draw: i64,
    lose: i64,
    goals: GoalTotals,
}

#[derive(Debug, Deserialize)]
struct GoalTotals {
    #[serde(rename = "for")]
    scored: i64,
    against: i64,
}

#[derive(Debug, Deserialize)]
struct PlayerEntry {
    player: Named,
    // Only the first block is read; later ones may be partial
    statistics: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct PlayerStatistics {
    team: Named,
    games: Games,
    goals: PlayerGoals,
}

#[derive(Debug, Deserialize)]
struct Games {
    // Misspelled upstream
    #[serde(default, rename = "appearences")]
    appearances: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PlayerGoals {
    #[serde(default)]
    total: Option<i64>,
    #[serde(default)]
    assists: Option<i64>,
}

/// Parse the `/standings` response into one row per team
pub fn parse_standings(records: &[Value]) -> Result<Vec<StandingsRow>, ParseError> {
    let first = records.first().ok_or(ParseError::NoRecords("standings"))?;

    let groups = first
        .get("league")
        .and_then(|league| league.get("standings"))
        .and_then(Value::as_array)
        .filter(|groups| !groups.is_empty())
        .ok_or(ParseError::InvalidStructure("missing league standings"))?;

    let table = groups[0]
        .as_array()
        .filter(|table| !table.is_empty())
        .ok_or(ParseError::InvalidStructure("no teams in standings"))?;

    let mut rows = Vec::with_capacity(table.len());
    for (idx, entry) in table.iter().enumerate() {
        match StandingsEntry::deserialize(entry) {
            Ok(team) => rows.push(StandingsRow {
                rank: team.rank,
                team: team.team.name,
                points: team.points,
                played: team.all.played,
                wins: team.all.win,
                draws: team.all.draw,
                losses: team.all.lose,
                goals_for: team.all.goals.scored,
                goals_against: team.all.goals.against,
                goal_difference: team.goals_diff,
            }),
            Err(e) => {
                log::error!("Missing key in team data (entry {}): {}", idx, e);
            }
        }
    }

    if rows.is_empty() {
        return Err(ParseError::NoValidRows("standings"));
    }

    log::info!("✓ Parsed {} teams from standings", rows.len());
    Ok(rows)
}

/// Parse the `/players/topscorers` response
pub fn parse_top_scorers(records: &[Value]) -> Result<Vec<ScorerRow>, ParseError> {
    let rows = parse_players(records, "top scorers", |goals| goals.total)?
        .into_iter()
        .map(|p| ScorerRow {
            player: p.player,
            team: p.team,
            goals: p.metric,
            appearances: p.appearances,
        })
        .collect();
    Ok(rows)
}

/// Parse the `/players/topassists` response
pub fn parse_top_assists(records: &[Value]) -> Result<Vec<AssistRow>, ParseError> {
    let rows = parse_players(records, "top assists", |goals| goals.assists)?
        .into_iter()
        .map(|p| AssistRow {
            player: p.player,
            team: p.team,
            assists: p.metric,
            appearances: p.appearances,
        })
        .collect();
    Ok(rows)
}

struct PlayerLine {
    player: String,
    team: String,
    metric: i64,
    appearances: i64,
}

fn parse_players<F>(
    records: &[Value],
    dataset: &'static str,
    metric: F,
) -> Result<Vec<PlayerLine>, ParseError>
where
    F: Fn(&PlayerGoals) -> Option<i64>,
{
    if records.is_empty() {
        return Err(ParseError::NoRecords(dataset));
    }

    let mut rows = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let entry = match PlayerEntry::deserialize(record) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping player {} due to missing data: {}", idx, e);
                continue;
            }
        };

        let player = entry.player.name;
        let Some(first) = entry.statistics.first() else {
            log::warn!("Skipping player {} ({}): no statistics", idx, player);
            continue;
        };
        let stats = match PlayerStatistics::deserialize(first) {
            Ok(stats) => stats,
            Err(e) => {
                log::warn!("Skipping player {} ({}) due to missing data: {}", idx, player, e);
                continue;
            }
        };

        // Null metric means "no data", not zero
        let Some(value) = metric(&stats.goals) else {
            continue;
        };

        rows.push(PlayerLine {
            player,
            team: stats.team.name,
            metric: value,
            appearances: stats.games.appearances.unwrap_or(0),
        });
    }

    if rows.is_empty() {
        return Err(ParseError::NoValidRows(dataset));
    }

    log::info!("✓ Parsed {} players from {}", rows.len(), dataset);
    Ok(rows)
}
