use chrono::NaiveDate;
use deltabc_parser::{parse_calendar_date, StationCatalog, WaterQualityTable, DATE_COLUMN};
use serde::Serialize;
use tracing::warn;

use crate::error::{PipelineError, Result};

/// Sampling span of one station in the survey table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationCoverage {
    pub station: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rows: usize,
    /// Date of the station's first row in file order.
    pub first_date: Option<NaiveDate>,
    /// Date of the station's last row in file order.
    pub last_date: Option<NaiveDate>,
}

fn cell_date(raw: Option<&str>, station: &str, line: usize) -> Result<NaiveDate> {
    let text = raw.unwrap_or_default();
    parse_calendar_date(text).ok_or_else(|| PipelineError::InvalidDate {
        station: station.to_string(),
        line,
        value: text.to_string(),
    })
}

/// One entry per catalog station, in catalog order. With `since`, only
/// stations whose last sample is on or after that day are kept.
pub fn station_coverage(
    catalog: &StationCatalog,
    table: &WaterQualityTable,
    since: Option<NaiveDate>,
) -> Result<Vec<StationCoverage>> {
    for code in table.station_codes()? {
        if !catalog.contains(&code) {
            warn!(station = %code, "station has survey rows but is not in the catalog");
        }
    }

    let mut coverage = Vec::with_capacity(catalog.len());
    for info in &catalog.stations {
        let rows = table.station_rows(&info.code)?;
        let height = rows.height();
        let (first_date, last_date) = if height == 0 {
            (None, None)
        } else {
            let dates = rows.column(DATE_COLUMN)?.str()?;
            let lines = table.station_lines(&info.code)?;
            let line = |row: usize| lines.get(row).copied().unwrap_or(row + 2);
            (
                Some(cell_date(dates.get(0), &info.code, line(0))?),
                Some(cell_date(dates.get(height - 1), &info.code, line(height - 1))?),
            )
        };

        if let Some(since) = since {
            if last_date.map_or(true, |last| last < since) {
                continue;
            }
        }

        coverage.push(StationCoverage {
            station: info.code.clone(),
            latitude: info.latitude,
            longitude: info.longitude,
            rows: height,
            first_date,
            last_date,
        });
    }

    Ok(coverage)
}
