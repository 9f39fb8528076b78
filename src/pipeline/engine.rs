//! Pipeline Engine - fetch → parse → validate → export
//!
//! Runs the three datasets one after another. A failure in any stage is
//! recorded against that dataset only; the remaining datasets still run.
//!
//! ```text
//! ApiClient::fetch_league()
//!     ↓
//! parse_* → Frame
//!     ↓
//! validate_*
//!     ↓
//! TableSink::overwrite()
//! ```

use super::db::TableSink;
use super::frame::Frame;
use super::parsers::{self, ParseError};
use super::validators;
use crate::api::{ApiClient, Endpoint, FetchError};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Standings,
    TopScorers,
    TopAssists,
}

impl Dataset {
    /// Processing order
    pub const ALL: [Dataset; 3] = [Dataset::Standings, Dataset::TopScorers, Dataset::TopAssists];

    pub fn endpoint(&self) -> Endpoint {
        match self {
            Dataset::Standings => Endpoint::Standings,
            Dataset::TopScorers => Endpoint::TopScorers,
            Dataset::TopAssists => Endpoint::TopAssists,
        }
    }

    /// Destination table
    pub fn table_name(&self) -> &'static str {
        match self {
            Dataset::Standings => "epl_standings",
            Dataset::TopScorers => "epl_top_scorers",
            Dataset::TopAssists => "epl_top_assists",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dataset::Standings => "standings",
            Dataset::TopScorers => "top scorers",
            Dataset::TopAssists => "top assists",
        }
    }

    pub fn parse(&self, records: &[Value]) -> Result<Frame, ParseError> {
        Ok(match self {
            Dataset::Standings => Frame::from_records(&parsers::parse_standings(records)?),
            Dataset::TopScorers => Frame::from_records(&parsers::parse_top_scorers(records)?),
            Dataset::TopAssists => Frame::from_records(&parsers::parse_top_assists(records)?),
        })
    }

    pub fn validate(&self, frame: &Frame) -> bool {
        match self {
            Dataset::Standings => validators::validate_standings(frame),
            Dataset::TopScorers => validators::validate_top_scorers(frame),
            Dataset::TopAssists => validators::validate_top_assists(frame),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What happened to one dataset during a run
#[derive(Debug)]
pub enum DatasetOutcome {
    Exported { rows: usize },
    FetchFailed(FetchError),
    ParseFailed(ParseError),
    ValidationFailed,
    ExportFailed,
}

impl DatasetOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DatasetOutcome::Exported { .. })
    }
}

impl fmt::Display for DatasetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetOutcome::Exported { rows } => write!(f, "exported {} rows", rows),
            DatasetOutcome::FetchFailed(e) => write!(f, "fetch failed: {}", e),
            DatasetOutcome::ParseFailed(e) => write!(f, "parse failed: {}", e),
            DatasetOutcome::ValidationFailed => write!(f, "validation failed"),
            DatasetOutcome::ExportFailed => write!(f, "export failed"),
        }
    }
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    outcomes: Vec<(Dataset, DatasetOutcome)>,
}

impl PipelineReport {
    /// True only if every dataset was exported
    pub fn success(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|(_, o)| o.is_success())
    }

    pub fn outcome(&self, dataset: Dataset) -> Option<&DatasetOutcome> {
        self.outcomes
            .iter()
            .find(|(d, _)| *d == dataset)
            .map(|(_, o)| o)
    }

    pub fn outcomes(&self) -> &[(Dataset, DatasetOutcome)] {
        &self.outcomes
    }

    /// Process exit code: 0 on full success, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

pub struct PipelineEngine<S: TableSink> {
    client: ApiClient,
    sink: S,
}

impl<S: TableSink> PipelineEngine<S> {
    pub fn new(client: ApiClient, sink: S) -> Self {
        Self { client, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run every dataset once
    pub async fn run(&mut self) -> PipelineReport {
        log::info!("{}", "=".repeat(60));
        log::info!("🚀 Starting EPL data pipeline");
        log::info!(
            "   └─ League {} / season {}",
            self.client.league_id(),
            self.client.season()
        );
        log::info!("{}", "=".repeat(60));

        let mut report = PipelineReport::default();
        for dataset in Dataset::ALL {
            let outcome = self.process(dataset).await;
            report.outcomes.push((dataset, outcome));
        }

        log::info!("{}", "=".repeat(60));
        if report.success() {
            log::info!("✅ Pipeline completed successfully");
        } else {
            log::error!("❌ Pipeline completed with errors");
        }
        for (dataset, outcome) in report.outcomes() {
            log::info!("   ├─ {}: {}", dataset, outcome);
        }
        log::info!("{}", "=".repeat(60));

        report
    }

    /// Fetch, parse, validate and export a single dataset
    pub async fn process(&mut self, dataset: Dataset) -> DatasetOutcome {
        log::info!("📊 Processing {}...", dataset);

        let records = match self.client.fetch_league(dataset.endpoint()).await {
            Ok(records) => records,
            Err(e) => {
                log::error!("❌ Failed to fetch {}: {}", dataset, e);
                return DatasetOutcome::FetchFailed(e);
            }
        };

        let frame = match dataset.parse(&records) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("❌ Failed to parse {}: {}", dataset, e);
                return DatasetOutcome::ParseFailed(e);
            }
        };

        if !dataset.validate(&frame) {
            return DatasetOutcome::ValidationFailed;
        }

        if !self.sink.overwrite(&frame, dataset.table_name()) {
            return DatasetOutcome::ExportFailed;
        }

        DatasetOutcome::Exported { rows: frame.len() }
    }
}
