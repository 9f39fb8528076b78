//! Column-oriented table passed between parsers, validators and the exporter
//!
//! A [`Frame`] is a list of named columns plus rows of [`Cell`]s. Parsers
//! build one from typed rows via [`Record`]; validators read typed columns
//! back out; the exporter writes whatever columns are present.

use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Cell {
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Int(_) => "integer",
            Cell::Real(_) => "real",
            Cell::Text(_) => "text",
            Cell::Timestamp(_) => "timestamp",
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Cell::Timestamp(value)
    }
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Cell::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            Cell::Int(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            Cell::Real(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            Cell::Text(s) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
            Cell::Timestamp(ts) => ts.to_sql(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("missing column '{0}'")]
    MissingColumn(String),
    #[error("column '{column}' row {row}: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        row: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("row has {found} cells but frame has {expected} columns")]
    Arity { expected: usize, found: usize },
}

/// A typed row that can be flattened into a frame
pub trait Record {
    /// Column names, in the order `cells` produces values
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_records<R: Record>(records: &[R]) -> Self {
        Self {
            columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records.iter().map(Record::cells).collect(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), FrameError> {
        if row.len() != self.columns.len() {
            return Err(FrameError::Arity {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Names from `required` that this frame lacks, in the given order
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect()
    }

    fn index_of(&self, name: &str) -> Result<usize, FrameError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    pub fn column_cells(&self, name: &str) -> Result<Vec<&Cell>, FrameError> {
        let idx = self.index_of(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Column as integers; any non-integer cell (including null) is an error
    pub fn int_column(&self, name: &str) -> Result<Vec<i64>, FrameError> {
        let idx = self.index_of(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| match &cells[idx] {
                Cell::Int(v) => Ok(*v),
                other => Err(FrameError::TypeMismatch {
                    column: name.to_string(),
                    row,
                    expected: "integer",
                    found: other.type_name(),
                }),
            })
            .collect()
    }

    pub fn text_column(&self, name: &str) -> Result<Vec<&str>, FrameError> {
        let idx = self.index_of(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| match &cells[idx] {
                Cell::Text(s) => Ok(s.as_str()),
                other => Err(FrameError::TypeMismatch {
                    column: name.to_string(),
                    row,
                    expected: "text",
                    found: other.type_name(),
                }),
            })
            .collect()
    }

    /// Replace a column's cells, or append the column if it is new
    pub fn set_column(&mut self, name: &str, cells: Vec<Cell>) -> Result<(), FrameError> {
        if cells.len() != self.rows.len() {
            return Err(FrameError::Arity {
                expected: self.rows.len(),
                found: cells.len(),
            });
        }

        match self.index_of(name) {
            Ok(idx) => {
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row[idx] = cell;
                }
            }
            Err(_) => {
                self.columns.push(name.to_string());
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            }
        }
        Ok(())
    }

    /// Remove a column, returning its cells
    #[cfg(test)]
    pub fn drop_column(&mut self, name: &str) -> Option<Vec<Cell>> {
        let idx = self.index_of(name).ok()?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }
}
