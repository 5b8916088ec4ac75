use chrono::NaiveDate;
use polars::prelude::*;

use crate::errors::ParserError;
use crate::formats::parse_optional_f64;

pub const STATION_COLUMN: &str = "Station";
pub const DEPTH_COLUMN: &str = "Depth";
pub const DATE_COLUMN: &str = "Date";
pub const LATITUDE_COLUMN: &str = "Latitude";
pub const LONGITUDE_COLUMN: &str = "Longitude";

/// Wide survey table: one row per station visit, one column per analyte.
/// Every column holds the raw cell text; blank cells are null.
#[derive(Debug, Clone)]
pub struct WaterQualityTable {
    pub df: DataFrame,
    pub(crate) lines: Vec<usize>,
}

impl WaterQualityTable {
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    pub fn text_column(&self, name: &str) -> PolarsResult<&StringChunked> {
        self.df.column(name)?.str()
    }

    /// Rows for a single station, in file order.
    pub fn station_rows(&self, station: &str) -> PolarsResult<DataFrame> {
        let mask = self.text_column(STATION_COLUMN)?.equal(station);
        self.df.filter(&mask)
    }

    /// File line of table row `row` (header is line 1).
    pub fn line(&self, row: usize) -> usize {
        self.lines.get(row).copied().unwrap_or(row + 2)
    }

    /// File lines of a single station's rows, aligned with [`Self::station_rows`].
    pub fn station_lines(&self, station: &str) -> PolarsResult<Vec<usize>> {
        let stations = self.text_column(STATION_COLUMN)?;
        Ok(stations
            .into_iter()
            .enumerate()
            .filter(|(_, code)| *code == Some(station))
            .map(|(row, _)| self.line(row))
            .collect())
    }

    /// Distinct station codes in order of first appearance.
    pub fn station_codes(&self) -> PolarsResult<Vec<String>> {
        let stations = self.text_column(STATION_COLUMN)?;
        let mut codes: Vec<String> = Vec::new();
        for code in stations.into_iter().flatten() {
            if !codes.iter().any(|existing| existing == code) {
                codes.push(code.to_string());
            }
        }
        Ok(codes)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationInfo {
    pub code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    pub stations: Vec<StationInfo>,
}

impl StationCatalog {
    pub fn get(&self, code: &str) -> Option<&StationInfo> {
        self.stations.iter().find(|station| station.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// A table keyed by `Date` whose remaining columns hold raw text until a
/// caller asks for one of them as numbers.
#[derive(Debug, Clone)]
pub struct DatedTable {
    pub dates: Vec<NaiveDate>,
    pub values: DataFrame,
    pub(crate) lines: Vec<usize>,
}

impl DatedTable {
    pub(crate) const PARSER: &'static str = "DATED_TABLE";

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn value_column_names(&self) -> Vec<String> {
        self.values
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Parses one value column as floats. NA tokens become `None`; any other
    /// non-numeric text is an error.
    pub fn numeric_column(&self, column: &str) -> Result<Vec<Option<f64>>, ParserError> {
        let values = self
            .values
            .column(column)
            .and_then(|col| col.str())
            .map_err(|_| ParserError::MissingColumn {
                parser: Self::PARSER,
                column: column.to_string(),
            })?;

        let mut parsed = Vec::with_capacity(values.len());
        for (idx, cell) in values.into_iter().enumerate() {
            let line_index = self.lines.get(idx).copied().unwrap_or(idx + 2);
            match cell {
                Some(text) => parsed.push(parse_optional_f64(Self::PARSER, text, line_index, column)?),
                None => parsed.push(None),
            }
        }
        Ok(parsed)
    }
}
