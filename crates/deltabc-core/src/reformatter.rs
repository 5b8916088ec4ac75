//! Wide survey rows to the long layouts of the legacy lab and field datasets.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use csv::{Terminator, WriterBuilder};
use deltabc_parser::{WaterQualityTable, DATE_COLUMN, DEPTH_COLUMN, STATION_COLUMN};
use polars::prelude::StringChunked;
use serde::Serialize;
use tracing::info;

use crate::analytes::AnalyteSchema;
use crate::coercion::CellPolicy;
use crate::error::{PipelineError, Result};

const LAB_CATEGORY: &str = "Discrete WQ";
const LAB_TAG: &str = "Nutrients";
const LAB_UNIT: &str = "mg/L";
const LAB_FLAG: &str = "=";
const FIELD_MEDIUM: &str = "Water";

/// Both output streams, fully rendered and not yet written.
#[derive(Debug, Clone, Default)]
pub struct RenderedOutput {
    pub lab: Vec<u8>,
    pub field: Vec<u8>,
    pub lab_rows: usize,
    pub field_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReformatSummary {
    pub input_rows: usize,
    pub lab_rows: usize,
    pub field_rows: usize,
}

/// `%f` formatting: six decimals, `nan` for a missing value.
fn fixed6(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.6}"),
        None => "nan".to_string(),
    }
}

fn require<'a>(table: &'a WaterQualityTable, column: &str) -> Result<&'a StringChunked> {
    if !table.has_column(column) {
        return Err(PipelineError::MissingColumn {
            table: "water quality table",
            column: column.to_string(),
        });
    }
    Ok(table.text_column(column)?)
}

fn numeric(
    column: &str,
    raw: Option<&str>,
    station: &str,
    line: usize,
) -> Result<Option<f64>> {
    CellPolicy::Reject
        .apply(raw)
        .map_err(|text| PipelineError::CellRejected {
            station: station.to_string(),
            column: column.to_string(),
            line,
            value: text.to_string(),
        })
}

/// One row per (input row, analyte), analytes in schema order within each input row.
pub fn render_schema(
    table: &WaterQualityTable,
    schema: AnalyteSchema,
    program_label: &str,
) -> Result<Vec<Vec<String>>> {
    let stations = require(table, STATION_COLUMN)?;
    let depths = require(table, DEPTH_COLUMN)?;
    let dates = require(table, DATE_COLUMN)?;
    let analytes = schema.analytes();
    let values = analytes
        .iter()
        .map(|analyte| require(table, analyte.code))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(table.height() * analytes.len());
    for row in 0..table.height() {
        let station = stations.get(row).unwrap_or_default();
        let depth = depths.get(row);
        let date = dates.get(row).unwrap_or_default();
        let line = table.line(row);
        let lab_depth = match schema {
            AnalyteSchema::Lab => fixed6(numeric(DEPTH_COLUMN, depth, station, line)?),
            AnalyteSchema::Field => String::new(),
        };

        for (analyte, column) in analytes.iter().zip(values.iter()) {
            let value = column.get(row);
            let fields = match schema {
                AnalyteSchema::Lab => vec![
                    program_label.to_string(),
                    LAB_CATEGORY.to_string(),
                    station.to_string(),
                    lab_depth.clone(),
                    date.to_string(),
                    analyte.long_name.to_string(),
                    LAB_FLAG.to_string(),
                    value.unwrap_or_default().to_string(),
                    LAB_UNIT.to_string(),
                    String::new(),
                    String::new(),
                    LAB_TAG.to_string(),
                ],
                AnalyteSchema::Field => vec![
                    program_label.to_string(),
                    date.to_string(),
                    station.to_string(),
                    depth.unwrap_or_default().to_string(),
                    String::new(),
                    String::new(),
                    fixed6(numeric(analyte.code, value, station, line)?),
                    FIELD_MEDIUM.to_string(),
                    String::new(),
                    String::new(),
                    analyte.long_name.to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                ],
            };
            debug_assert_eq!(fields.len(), schema.field_count());
            rows.push(fields);
        }
    }

    Ok(rows)
}

fn encode(rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|err| PipelineError::Csv(csv::Error::from(err.into_error())))
}

/// Renders both schemas. Nothing is written, so any error leaves the outputs untouched.
pub fn render(table: &WaterQualityTable, program_label: &str) -> Result<RenderedOutput> {
    let lab_rows = render_schema(table, AnalyteSchema::Lab, program_label)?;
    let field_rows = render_schema(table, AnalyteSchema::Field, program_label)?;

    Ok(RenderedOutput {
        lab: encode(&lab_rows)?,
        field: encode(&field_rows)?,
        lab_rows: lab_rows.len(),
        field_rows: field_rows.len(),
    })
}

fn append_to(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.flush().map_err(io_err)
}

/// Appends the rendered rows; existing content is never rewritten.
pub fn append_outputs(output: &RenderedOutput, lab_path: &Path, field_path: &Path) -> Result<()> {
    append_to(lab_path, &output.lab)?;
    info!(path = %lab_path.display(), rows = output.lab_rows, "lab rows appended");
    append_to(field_path, &output.field)?;
    info!(path = %field_path.display(), rows = output.field_rows, "field rows appended");
    Ok(())
}
