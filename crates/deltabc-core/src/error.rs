// crates/deltabc-core/src/error.rs

use std::path::PathBuf;

use chrono::NaiveDate;
use deltabc_parser::ParserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration file could not be parsed: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Column '{column}' not found in {table}")]
    MissingColumn { table: &'static str, column: String },

    #[error("Station '{station}' has no rows in the water quality table")]
    StationNotFound { station: String },

    #[error("Station '{station}' is not listed in the station catalog")]
    UnknownStation { station: String },

    /// `line` is the 1-based line of the water quality file (header is line 1).
    #[error("Station {station} line {line}: {column} value '{value}' is not numeric")]
    CellRejected {
        station: String,
        column: String,
        line: usize,
        value: String,
    },

    #[error("Station {station} line {line}: unparseable date '{value}'")]
    InvalidDate {
        station: String,
        line: usize,
        value: String,
    },

    #[error("Calendar start {start} is after calendar end {end}")]
    InvalidCalendar { start: NaiveDate, end: NaiveDate },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
