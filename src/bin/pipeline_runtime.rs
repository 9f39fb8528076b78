//! Pipeline Runtime - one-shot EPL stats export
//!
//! Fetches standings, top scorers and top assists, validates them and
//! replaces the SQLite tables. Exits 0 only if all three were exported.
//!
//! Usage:
//!   cargo run --release --bin pipeline_runtime
//!
//! Environment variables:
//!   API_FOOTBALL_KEY - API key (required)
//!   SEASON - season start year (default: derived from today's date)
//!   SQL_DATABASE - SQLite database path (default: epl.db)
//!   SQL_SCHEMA - schema to write into (default: main)
//!   PIPELINE_LOG_FILE - log file, empty to disable (default: pipeline.log)

use anyhow::Context;
use dotenv::dotenv;
use eplflow::api::ApiClient;
use eplflow::config::Config;
use eplflow::logging;
use eplflow::pipeline::{open_database, PipelineEngine, SqliteTableWriter};
use log::{error, info};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = logging::init_stderr("info");
            error!("❌ Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("❌ Pipeline failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<u8> {
    info!("🔧 Configuration loaded");
    info!("   ├─ API key: {}", config.api.masked_key());
    info!("   ├─ League: {} / season {}", config.api.league_id, config.api.season);
    info!("   ├─ Database: {} (schema {})", config.database.path, config.database.schema);
    info!(
        "   └─ Log file: {}",
        config.log_file.as_deref().unwrap_or("(disabled)")
    );

    let conn = open_database(&config.database)
        .with_context(|| format!("failed to connect to database {}", config.database.path))?;
    let sink = SqliteTableWriter::new(conn, config.database.schema.clone());

    let client = ApiClient::new(&config.api).context("failed to build API client")?;

    let mut engine = PipelineEngine::new(client, sink);
    let report = engine.run().await;

    Ok(report.exit_code())
}
