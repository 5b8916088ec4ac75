use chrono::NaiveDate;
use deltabc_parser::DatedTable;
use polars::prelude::*;

use crate::error::{PipelineError, Result};

pub const DATE_OUTPUT: &str = "Date";
pub const FLOW_OUTPUT: &str = "flow ft3/s";
pub const AMMONIA_OUTPUT: &str = "NH3 mg/L N";
pub const NITRATE_OUTPUT: &str = "NO3 mg/L N";
pub const PHOSPHATE_OUTPUT: &str = "PO4 mg/L P";

pub const OUTPUT_COLUMNS: [&str; 5] = [
    DATE_OUTPUT,
    FLOW_OUTPUT,
    AMMONIA_OUTPUT,
    NITRATE_OUTPUT,
    PHOSPHATE_OUTPUT,
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily river flow, ft3/s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowSeries {
    pub dates: Vec<NaiveDate>,
    pub flow: Vec<Option<f64>>,
}

impl FlowSeries {
    /// Takes `column`, or the only column after `Date` when none is named.
    /// A table with several value columns needs an explicit `column`.
    pub fn from_table(table: &DatedTable, column: Option<&str>) -> Result<Self> {
        let column = match column {
            Some(name) => name.to_string(),
            None => {
                let mut names = table.value_column_names();
                match names.len() {
                    1 => names.remove(0),
                    0 => {
                        return Err(PipelineError::MissingColumn {
                            table: "flow series",
                            column: "<flow>".to_string(),
                        })
                    }
                    _ => {
                        return Err(PipelineError::Config(format!(
                            "flow table has several value columns ({}); set flow_column",
                            names.join(", ")
                        )))
                    }
                }
            }
        };
        let flow = table.numeric_column(&column)?;
        Ok(Self {
            dates: table.dates.clone(),
            flow,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NutrientSample {
    pub date: NaiveDate,
    pub source_station: String,
    /// mg/L as N
    pub ammonia: Option<f64>,
    /// mg/L as N
    pub nitrate_nitrite: Option<f64>,
    /// mg/L as P
    pub orthophosphate: Option<f64>,
}

/// Derived nutrients in concatenation order. Dates may repeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedNutrientSeries {
    pub samples: Vec<NutrientSample>,
}

impl DerivedNutrientSeries {
    /// Joins segments end to end without sorting or removing repeated dates.
    pub fn concat(segments: impl IntoIterator<Item = DerivedNutrientSeries>) -> Self {
        let mut samples = Vec::new();
        for segment in segments {
            samples.extend(segment.samples);
        }
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub flow: Option<f64>,
    pub ammonia: Option<f64>,
    pub nitrate_nitrite: Option<f64>,
    pub orthophosphate: Option<f64>,
}

impl DailyRecord {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            flow: None,
            ammonia: None,
            nitrate_nitrite: None,
            orthophosphate: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledDailySeries {
    pub records: Vec<DailyRecord>,
}

impl ReconciledDailySeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reads a previously written accumulation table.
    pub fn from_dated_table(table: &DatedTable) -> Result<Self> {
        let flow = table.numeric_column(FLOW_OUTPUT)?;
        let ammonia = table.numeric_column(AMMONIA_OUTPUT)?;
        let nitrate = table.numeric_column(NITRATE_OUTPUT)?;
        let phosphate = table.numeric_column(PHOSPHATE_OUTPUT)?;

        let records = table
            .dates
            .iter()
            .enumerate()
            .map(|(idx, date)| DailyRecord {
                date: *date,
                flow: flow[idx],
                ammonia: ammonia[idx],
                nitrate_nitrite: nitrate[idx],
                orthophosphate: phosphate[idx],
            })
            .collect();

        Ok(Self { records })
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let len = self.records.len();
        let mut dates = Vec::with_capacity(len);
        let mut flow = Vec::with_capacity(len);
        let mut ammonia = Vec::with_capacity(len);
        let mut nitrate = Vec::with_capacity(len);
        let mut phosphate = Vec::with_capacity(len);

        for record in &self.records {
            dates.push(record.date.format(DATE_FORMAT).to_string());
            flow.push(record.flow);
            ammonia.push(record.ammonia);
            nitrate.push(record.nitrate_nitrite);
            phosphate.push(record.orthophosphate);
        }

        DataFrame::new(vec![
            Series::new(DATE_OUTPUT.into(), dates).into(),
            Series::new(FLOW_OUTPUT.into(), flow).into(),
            Series::new(AMMONIA_OUTPUT.into(), ammonia).into(),
            Series::new(NITRATE_OUTPUT.into(), nitrate).into(),
            Series::new(PHOSPHATE_OUTPUT.into(), phosphate).into(),
        ])
    }
}
