//! SQLite sink with "replace table contents" semantics
//!
//! Every export stamps an `exported_at` column, then drops and recreates the
//! destination table and bulk-inserts the rows, all inside one transaction.
//! A failed export leaves the previous table untouched.

use super::frame::{Cell, Frame, FrameError};
use crate::config::DatabaseConfig;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, Transaction};
use std::path::Path;
use thiserror::Error;

/// Ingestion timestamp column added to every exported table
pub const EXPORTED_AT: &str = "exported_at";

/// SQLite's default cap on bound parameters per statement
const MAX_BOUND_PARAMETERS: usize = 999;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid {EXPORTED_AT} value in row {row}: {value}")]
    InvalidTimestamp { row: usize, value: String },
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("table {0} does not exist")]
    TableNotFound(String),
}

/// Destination for validated tables
pub trait TableSink {
    /// Replace `table` with the contents of `frame`
    ///
    /// Returns false (after logging the cause) if nothing was written.
    fn overwrite(&mut self, frame: &Frame, table: &str) -> bool;
}

/// Open the database, apply pragmas and check the connection is usable
///
/// A schema other than `main` is attached from `<schema>.db` in the same
/// directory as the main database file.
pub fn open_database(config: &DatabaseConfig) -> Result<Connection, ExportError> {
    let path = Path::new(&config.path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    if config.schema != "main" {
        let attached = path.with_file_name(format!("{}.db", config.schema));
        conn.execute(
            &format!("ATTACH DATABASE ?1 AS {}", quote_ident(&config.schema)),
            [attached.to_string_lossy().into_owned()],
        )?;
        log::info!("📎 Attached schema {} from {}", config.schema, attached.display());
    }

    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;

    log::info!("✓ Database connection established: {}", config.path);
    Ok(conn)
}

pub struct SqliteTableWriter {
    conn: Connection,
    schema: String,
}

impl SqliteTableWriter {
    pub fn new(conn: Connection, schema: impl Into<String>) -> Self {
        Self {
            conn,
            schema: schema.into(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Replace `table` with `frame`, stamping every row with `exported_at`
    ///
    /// Returns the number of rows written.
    pub fn overwrite_at(
        &mut self,
        frame: &Frame,
        table: &str,
        exported_at: NaiveDateTime,
    ) -> Result<usize, ExportError> {
        let frame = stamp_export_time(frame, exported_at)?;
        let qualified = format!("{}.{}", quote_ident(self.schema()), quote_ident(table));

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", qualified), [])?;
        tx.execute(&create_table_sql(&qualified, &frame), [])?;
        insert_rows(&tx, &qualified, &frame)?;
        tx.commit()?;

        Ok(frame.len())
    }
}

impl TableSink for SqliteTableWriter {
    fn overwrite(&mut self, frame: &Frame, table: &str) -> bool {
        match self.overwrite_at(frame, table, Utc::now().naive_utc()) {
            Ok(rows) => {
                log::info!(
                    "✓ Successfully wrote {} rows to {}.{}",
                    rows,
                    self.schema(),
                    table
                );
                true
            }
            Err(e) => {
                log::error!("Failed to write table {}.{}: {}", self.schema(), table, e);
                false
            }
        }
    }
}

/// Read a table back into a frame, in insertion order
///
/// `DATETIME` columns come back as timestamps.
pub fn read_table(conn: &Connection, schema: &str, table: &str) -> Result<Frame, ExportError> {
    let mut info = conn.prepare(&format!(
        "PRAGMA {}.table_info({})",
        quote_ident(schema),
        quote_ident(table)
    ))?;
    let columns: Vec<(String, String)> = info
        .query_map([], |row| Ok((row.get(1)?, row.get(2)?)))?
        .collect::<Result<_, _>>()?;

    if columns.is_empty() {
        return Err(ExportError::TableNotFound(format!("{}.{}", schema, table)));
    }

    let names: Vec<&str> = columns.iter().map(|(name, _)| name.as_str()).collect();
    let select = format!(
        "SELECT {} FROM {}.{} ORDER BY rowid",
        names.iter().map(|n| quote_ident(n)).collect::<Vec<_>>().join(", "),
        quote_ident(schema),
        quote_ident(table)
    );

    let mut frame = Frame::new(&names);
    let mut stmt = conn.prepare(&select)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(columns.len());
        for (idx, (_, decl_type)) in columns.iter().enumerate() {
            let cell = match row.get_ref(idx)? {
                ValueRef::Null => Cell::Null,
                _ if decl_type.eq_ignore_ascii_case("DATETIME") => Cell::Timestamp(row.get(idx)?),
                ValueRef::Integer(v) => Cell::Int(v),
                ValueRef::Real(v) => Cell::Real(v),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    Cell::Text(String::from_utf8_lossy(bytes).into_owned())
                }
            };
            cells.push(cell);
        }
        frame.push_row(cells)?;
    }

    Ok(frame)
}

/// Copy of `frame` with `exported_at` added, or normalized to naive UTC
fn stamp_export_time(frame: &Frame, exported_at: NaiveDateTime) -> Result<Frame, ExportError> {
    let cells = if frame.has_column(EXPORTED_AT) {
        frame
            .column_cells(EXPORTED_AT)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| normalize_timestamp(row, cell))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        vec![Cell::Timestamp(exported_at); frame.len()]
    };

    let mut stamped = frame.clone();
    stamped.set_column(EXPORTED_AT, cells)?;
    Ok(stamped)
}

fn normalize_timestamp(row: usize, cell: &Cell) -> Result<Cell, ExportError> {
    let invalid = || ExportError::InvalidTimestamp {
        row,
        value: format!("{:?}", cell),
    };

    match cell {
        Cell::Null => Ok(Cell::Null),
        Cell::Timestamp(ts) => Ok(Cell::Timestamp(*ts)),
        Cell::Int(secs) => DateTime::from_timestamp(*secs, 0)
            .map(|dt| Cell::Timestamp(dt.naive_utc()))
            .ok_or_else(invalid),
        Cell::Text(text) => {
            if let Ok(aware) = DateTime::parse_from_rfc3339(text) {
                return Ok(Cell::Timestamp(aware.naive_utc()));
            }
            ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(Cell::Timestamp)
                .ok_or_else(invalid)
        }
        Cell::Real(_) => Err(invalid()),
    }
}

fn create_table_sql(qualified: &str, frame: &Frame) -> String {
    let columns: Vec<String> = frame
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| format!("{} {}", quote_ident(name), column_type(frame, idx)))
        .collect();
    format!("CREATE TABLE {} ({})", qualified, columns.join(", "))
}

/// Declared type from the first non-null cell of a column
fn column_type(frame: &Frame, idx: usize) -> &'static str {
    frame
        .rows()
        .iter()
        .map(|row| &row[idx])
        .find(|cell| !matches!(cell, Cell::Null))
        .map(|cell| match cell {
            Cell::Int(_) => "INTEGER",
            Cell::Real(_) => "REAL",
            Cell::Timestamp(_) => "DATETIME",
            Cell::Text(_) | Cell::Null => "TEXT",
        })
        .unwrap_or(if frame.columns()[idx] == EXPORTED_AT {
            "DATETIME"
        } else {
            "TEXT"
        })
}

/// Multi-row INSERTs, chunked to stay under the bound-parameter limit
fn insert_rows(tx: &Transaction<'_>, qualified: &str, frame: &Frame) -> Result<(), ExportError> {
    let width = frame.columns().len();
    if width == 0 || frame.is_empty() {
        return Ok(());
    }

    let column_list = frame
        .columns()
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = format!("({})", vec!["?"; width].join(", "));
    let rows_per_chunk = (MAX_BOUND_PARAMETERS / width).max(1);

    for chunk in frame.rows().chunks(rows_per_chunk) {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            qualified,
            column_list,
            vec![placeholders.as_str(); chunk.len()].join(", ")
        );
        tx.execute(&sql, params_from_iter(chunk.iter().flatten()))?;
    }

    log::debug!("Inserted {} rows into {}", frame.len(), qualified);
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
