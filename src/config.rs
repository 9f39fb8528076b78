//! Runtime configuration loaded from environment variables
//!
//! Everything the pipeline needs is read once at startup into a [`Config`]
//! value and handed to each component. Nothing reads the environment after
//! that point.

use chrono::{DateTime, Datelike, Utc};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";
pub const DEFAULT_LEAGUE_ID: u32 = 39; // Premier League
pub const DEFAULT_DB_PATH: &str = "epl.db";
pub const DEFAULT_SCHEMA: &str = "main";
pub const DEFAULT_LOG_FILE: &str = "pipeline.log";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Settings for the sports-data API client
#[derive(Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub league_id: u32,
    pub season: i32,
    /// Total attempt budget per request (rate-limit waits included)
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub rate_limit_cooldown_secs: u64,
    pub backoff_base_secs: u64,
}

impl ApiConfig {
    /// First ten characters of the key, safe to log
    pub fn masked_key(&self) -> String {
        let prefix: String = self.api_key.chars().take(10).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &self.masked_key())
            .field("base_url", &self.base_url)
            .field("league_id", &self.league_id)
            .field("season", &self.season)
            .field("max_retries", &self.max_retries)
            .field("timeout_secs", &self.timeout_secs)
            .field("rate_limit_cooldown_secs", &self.rate_limit_cooldown_secs)
            .field("backoff_base_secs", &self.backoff_base_secs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Schema the tables are written under; anything other than `main` is
    /// attached as `<schema>.db` next to `path`
    pub schema: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub log_file: Option<String>,
    pub rust_log: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `API_FOOTBALL_KEY` (required)
    /// - `API_FOOTBALL_BASE_URL` (default: https://v3.football.api-sports.io)
    /// - `LEAGUE_ID` (default: 39)
    /// - `SEASON` (default: derived from the current date)
    /// - `API_MAX_RETRIES` (default: 3)
    /// - `API_TIMEOUT_SECS` (default: 10)
    /// - `API_RATE_LIMIT_COOLDOWN_SECS` (default: 60)
    /// - `API_BACKOFF_BASE_SECS` (default: 1)
    /// - `SQL_DATABASE` (default: epl.db)
    /// - `SQL_SCHEMA` (default: main)
    /// - `PIPELINE_LOG_FILE` (default: pipeline.log, empty disables)
    /// - `RUST_LOG` (default: info)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok(), Utc::now())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// `now` decides the default season.
    pub fn from_lookup<F>(lookup: F, now: DateTime<Utc>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API_FOOTBALL_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingVariable("API_FOOTBALL_KEY".to_string()))?;

        let base_url = lookup("API_FOOTBALL_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "API_FOOTBALL_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let season = match lookup("SEASON") {
            Some(raw) => raw.trim().parse::<i32>().map_err(|_| {
                ConfigError::InvalidValue(format!("SEASON must be a year, got '{}'", raw))
            })?,
            None => current_season(now),
        };

        let api = ApiConfig {
            api_key,
            base_url,
            league_id: parse_or(&lookup, "LEAGUE_ID", DEFAULT_LEAGUE_ID),
            season,
            max_retries: parse_or(&lookup, "API_MAX_RETRIES", 3),
            timeout_secs: parse_or(&lookup, "API_TIMEOUT_SECS", 10),
            rate_limit_cooldown_secs: parse_or(&lookup, "API_RATE_LIMIT_COOLDOWN_SECS", 60),
            backoff_base_secs: parse_or(&lookup, "API_BACKOFF_BASE_SECS", 1),
        };

        let schema = lookup("SQL_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
        if schema.is_empty() || !schema.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::InvalidValue(format!(
                "SQL_SCHEMA must be alphanumeric/underscore, got '{}'",
                schema
            )));
        }

        let database = DatabaseConfig {
            path: lookup("SQL_DATABASE").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            schema,
        };

        let log_file = match lookup("PIPELINE_LOG_FILE") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(path),
            None => Some(DEFAULT_LOG_FILE.to_string()),
        };

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            api,
            database,
            log_file,
            rust_log,
        })
    }
}

/// Football season a date falls into
///
/// Seasons start in August: from August onward it is the current year's
/// season, before that the previous year's.
pub fn current_season(now: DateTime<Utc>) -> i32 {
    if now.month() >= 8 {
        now.year()
    } else {
        now.year() - 1
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            log::warn!("Invalid {} '{}', defaulting to {}", name, raw, default);
            default
        }),
        None => default,
    }
}
