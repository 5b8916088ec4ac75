use chrono::NaiveDate;
use deltabc_parser::{parse_calendar_date, WaterQualityTable, DATE_COLUMN};
use polars::prelude::*;
use tracing::{debug, warn};

use crate::analytes::{
    DISSOLVED_ORGANIC_NITROGEN, NITRATE_NITRITE, ORTHOPHOSPHATE, TOTAL_KJELDAHL_NITROGEN,
};
use crate::coercion::coerce_column;
use crate::config::{SegmentConfig, SegmentWindow};
use crate::error::{PipelineError, Result};
use crate::series::{DerivedNutrientSeries, NutrientSample};

const REQUIRED_COLUMNS: [&str; 5] = [
    DATE_COLUMN,
    TOTAL_KJELDAHL_NITROGEN,
    DISSOLVED_ORGANIC_NITROGEN,
    NITRATE_NITRITE,
    ORTHOPHOSPHATE,
];

/// NH3 = TKN - DON. Missing if either input is missing.
pub fn ammonia_from_kjeldahl(tkn: Option<f64>, don: Option<f64>) -> Option<f64> {
    match (tkn, don) {
        (Some(tkn), Some(don)) => Some(tkn - don),
        _ => None,
    }
}

fn parse_dates(rows: &DataFrame, lines: &[usize], station: &str) -> Result<Vec<NaiveDate>> {
    let raw = rows.column(DATE_COLUMN)?.str()?;
    let mut dates = Vec::with_capacity(raw.len());
    for (row, cell) in raw.into_iter().enumerate() {
        let text = cell.unwrap_or_default();
        let date = parse_calendar_date(text).ok_or_else(|| PipelineError::InvalidDate {
            station: station.to_string(),
            line: lines.get(row).copied().unwrap_or(row + 2),
            value: text.to_string(),
        })?;
        dates.push(date);
    }
    Ok(dates)
}

/// Applies a segment window to one station's rows (file order). `lines`
/// holds the file line of each row and is narrowed the same way.
pub fn select_window(
    rows: DataFrame,
    lines: Vec<usize>,
    window: &SegmentWindow,
    station: &str,
) -> Result<(DataFrame, Vec<usize>)> {
    match *window {
        SegmentWindow::Full => Ok((rows, lines)),
        SegmentWindow::Tail { rows: count } => {
            let skip = lines.len().saturating_sub(count);
            Ok((rows.tail(Some(count)), lines[skip..].to_vec()))
        }
        SegmentWindow::DateRange { start, end } => {
            let dates = parse_dates(&rows, &lines, station)?;
            let keep: Vec<bool> = dates
                .iter()
                .map(|date| {
                    start.map_or(true, |start| *date >= start) && end.map_or(true, |end| *date <= end)
                })
                .collect();
            let kept_lines = lines
                .iter()
                .zip(keep.iter())
                .filter(|(_, keep)| **keep)
                .map(|(line, _)| *line)
                .collect();
            let mask = BooleanChunked::new("window".into(), keep);
            Ok((rows.filter(&mask)?, kept_lines))
        }
    }
}

/// Derives ammonia, nitrate+nitrite and orthophosphate for one surrogate segment.
pub fn derive_segment(
    table: &WaterQualityTable,
    segment: &SegmentConfig,
) -> Result<DerivedNutrientSeries> {
    for column in REQUIRED_COLUMNS {
        if !table.has_column(column) {
            return Err(PipelineError::MissingColumn {
                table: "water quality table",
                column: column.to_string(),
            });
        }
    }

    let station = segment.station.as_str();
    let rows = table.station_rows(station)?;
    if rows.height() == 0 {
        return Err(PipelineError::StationNotFound {
            station: station.to_string(),
        });
    }

    let lines = table.station_lines(station)?;
    let (rows, lines) = select_window(rows, lines, &segment.window, station)?;
    if rows.height() == 0 {
        warn!(station, window = ?segment.window, "surrogate window selected no rows");
    }

    let dates = parse_dates(&rows, &lines, station)?;
    let tkn = coerce_column(
        &rows,
        &lines,
        TOTAL_KJELDAHL_NITROGEN,
        segment.policy_for(TOTAL_KJELDAHL_NITROGEN),
        station,
    )?;
    let don = coerce_column(
        &rows,
        &lines,
        DISSOLVED_ORGANIC_NITROGEN,
        segment.policy_for(DISSOLVED_ORGANIC_NITROGEN),
        station,
    )?;
    let nitrate = coerce_column(
        &rows,
        &lines,
        NITRATE_NITRITE,
        segment.policy_for(NITRATE_NITRITE),
        station,
    )?;
    let phosphate = coerce_column(
        &rows,
        &lines,
        ORTHOPHOSPHATE,
        segment.policy_for(ORTHOPHOSPHATE),
        station,
    )?;

    let samples = dates
        .into_iter()
        .enumerate()
        .map(|(idx, date)| NutrientSample {
            date,
            source_station: station.to_string(),
            ammonia: ammonia_from_kjeldahl(tkn[idx], don[idx]),
            nitrate_nitrite: nitrate[idx],
            orthophosphate: phosphate[idx],
        })
        .collect::<Vec<_>>();

    debug!(station, rows = samples.len(), "derived surrogate segment");
    Ok(DerivedNutrientSeries { samples })
}
