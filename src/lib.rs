//! eplflow: English Premier League stats from API-Football into SQLite

pub mod api;
pub mod config;
pub mod logging;
pub mod pipeline;
