use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use polars::prelude::*;

use crate::errors::ParserError;

/// Cell contents read as "no value". Mirrors the NA vocabulary of the
/// upstream survey exports, which were produced by spreadsheet tooling.
pub const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

pub fn is_missing_token(value: &str) -> bool {
    MISSING_TOKENS.contains(&value.trim())
}

/// Parses the calendar day out of a date or date-time cell. Time of day is discarded.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    None
}

pub(crate) fn parse_date(
    parser: &'static str,
    value: &str,
    line_index: usize,
) -> Result<NaiveDate, ParserError> {
    parse_calendar_date(value).ok_or_else(|| ParserError::InvalidDate {
        parser,
        line_index,
        value: value.trim().to_string(),
    })
}

pub(crate) fn parse_optional_f64(
    parser: &'static str,
    value: &str,
    line_index: usize,
    column: &str,
) -> Result<Option<f64>, ParserError> {
    let trimmed = value.trim();
    if is_missing_token(trimmed) {
        return Ok(None);
    }

    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|err| ParserError::DataRow {
            parser,
            line_index,
            message: format!("failed to parse column '{column}' value '{trimmed}' as float: {err}"),
        })
}

pub(crate) fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes())
}

/// Reads the header row. A leading column with an empty name is the row index
/// written by older tooling and is kept as an empty string so callers can skip it.
pub(crate) fn read_header(
    parser: &'static str,
    reader: &mut csv::Reader<&[u8]>,
) -> Result<Vec<String>, ParserError> {
    let header = reader
        .headers()
        .map_err(|source| ParserError::Csv { parser, source })?
        .clone();

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(header.len());
    for (idx, raw) in header.iter().enumerate() {
        let name = raw.trim_start_matches('\u{feff}').trim().to_string();
        if name.is_empty() && idx != 0 {
            return Err(ParserError::Validation {
                parser,
                message: format!("header column {} has no name", idx + 1),
            });
        }
        if !name.is_empty() && !seen.insert(name.clone()) {
            return Err(ParserError::DuplicateColumn {
                parser,
                column: name,
            });
        }
        names.push(name);
    }

    Ok(names)
}

pub(crate) fn find_column(
    parser: &'static str,
    names: &[String],
    column: &str,
) -> Result<usize, ParserError> {
    names
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| ParserError::MissingColumn {
            parser,
            column: column.to_string(),
        })
}

pub(crate) fn line_of(record: &StringRecord, fallback: usize) -> usize {
    record
        .position()
        .map(|pos| pos.line() as usize)
        .unwrap_or(fallback)
}

/// Column-major buffer of raw cell text, turned into an all-string DataFrame.
pub(crate) struct StringColumns {
    names: Vec<String>,
    keep: Vec<usize>,
    values: Vec<Vec<Option<String>>>,
}

impl StringColumns {
    pub fn new(names: &[String], keep: Vec<usize>) -> Self {
        let values = keep.iter().map(|_| Vec::new()).collect();
        Self {
            names: keep.iter().map(|idx| names[*idx].clone()).collect(),
            keep,
            values,
        }
    }

    pub fn push_record(&mut self, record: &StringRecord) {
        for (slot, idx) in self.keep.iter().enumerate() {
            let cell = record
                .get(*idx)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            self.values[slot].push(cell);
        }
    }

    pub fn build(self, parser: &'static str) -> Result<DataFrame, ParserError> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.names.len());
        for (name, values) in self.names.iter().zip(self.values.iter()) {
            let utf8: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
            columns.push(Series::new(name.as_str().into(), utf8).into());
        }
        DataFrame::new(columns).map_err(|err| ParserError::Validation {
            parser,
            message: format!("failed to build dataframe: {err}"),
        })
    }
}
