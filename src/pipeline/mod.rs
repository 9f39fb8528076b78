//! # EPL stats pipeline
//!
//! Pulls three datasets from API-Football, checks them and replaces the
//! matching SQLite tables:
//!
//! | Dataset      | Endpoint              | Table             |
//! |--------------|-----------------------|-------------------|
//! | standings    | `/standings`          | `epl_standings`   |
//! | top scorers  | `/players/topscorers` | `epl_top_scorers` |
//! | top assists  | `/players/topassists` | `epl_top_assists` |
//!
//! ## Module Organization
//!
//! - `types` - typed rows per dataset
//! - `frame` - column-oriented table shared by all stages
//! - `parsers` - API records → rows
//! - `validators` - data-quality checks
//! - `db` - SQLite export (`TableSink`)
//! - `engine` - per-dataset orchestration

pub mod db;
pub mod engine;
pub mod frame;
pub mod parsers;
pub mod types;
pub mod validators;

pub use db::{open_database, read_table, ExportError, SqliteTableWriter, TableSink, EXPORTED_AT};
pub use engine::{Dataset, DatasetOutcome, PipelineEngine, PipelineReport};
pub use frame::{Cell, Frame, FrameError, Record};
pub use parsers::ParseError;
pub use types::{AssistRow, ScorerRow, StandingsRow};
