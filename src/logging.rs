//! Logger setup for the pipeline binary
//!
//! Lines go to stderr and, when a log file is configured, are appended to
//! that file as well.

use crate::config::Config;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    LogFile { path: String, source: io::Error },
    #[error("logger already initialized: {0}")]
    AlreadySet(#[from] log::SetLoggerError),
}

/// Install the global logger from `config`
pub fn init(config: &Config) -> Result<(), LoggingError> {
    let mut builder = builder(&config.rust_log);

    match &config.log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            builder.target(env_logger::Target::Pipe(Box::new(TeeWriter::new(io::stderr(), file))));
        }
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }

    builder.try_init()?;
    Ok(())
}

/// Stderr-only logger, used when configuration could not be loaded
pub fn init_stderr(filter: &str) -> Result<(), LoggingError> {
    builder(filter).target(env_logger::Target::Stderr).try_init()?;
    Ok(())
}

fn builder(filter: &str) -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} - {} - {} - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.target(),
            record.level(),
            record.args()
        )
    });
    builder
}

fn open_log_file(path: &str) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::LogFile {
            path: path.to_string(),
            source,
        })
}

/// Writes every byte to both sinks
pub struct TeeWriter<A: Write, B: Write> {
    primary: A,
    secondary: B,
}

impl<A: Write, B: Write> TeeWriter<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }

    #[cfg(test)]
    fn into_inner(self) -> (A, B) {
        (self.primary, self.secondary)
    }
}

impl<A: Write, B: Write> Write for TeeWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.primary.write_all(buf)?;
        self.secondary.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.secondary.flush()
    }
}
