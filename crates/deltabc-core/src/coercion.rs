use deltabc_parser::is_missing_token;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// What to do with a cell whose text is neither blank nor a number
/// (lab qualifiers such as `ND` or `<0.1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellPolicy {
    /// Read the cell as 0.
    ZeroFill,
    /// Read the cell as a missing value.
    Missing,
    /// Fail the run.
    #[default]
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Blank,
    Number(f64),
    Text(&'a str),
}

impl<'a> Cell<'a> {
    pub fn classify(raw: Option<&'a str>) -> Self {
        let Some(raw) = raw else {
            return Cell::Blank;
        };
        let trimmed = raw.trim();
        if is_missing_token(trimmed) {
            return Cell::Blank;
        }
        match trimmed.parse::<f64>() {
            Ok(value) => Cell::Number(value),
            Err(_) => Cell::Text(trimmed),
        }
    }
}

impl CellPolicy {
    /// Blank cells are always missing; the policy only decides non-numeric text.
    /// `Err` carries the offending text.
    pub fn apply<'a>(self, raw: Option<&'a str>) -> std::result::Result<Option<f64>, &'a str> {
        match Cell::classify(raw) {
            Cell::Blank => Ok(None),
            Cell::Number(value) => Ok(Some(value)),
            Cell::Text(text) => match self {
                CellPolicy::ZeroFill => Ok(Some(0.0)),
                CellPolicy::Missing => Ok(None),
                CellPolicy::Reject => Err(text),
            },
        }
    }
}

/// Coerces a text column of a single station's rows to numbers. `lines` holds
/// the file line of each row and is only used for error reporting.
pub fn coerce_column(
    rows: &DataFrame,
    lines: &[usize],
    column: &str,
    policy: CellPolicy,
    station: &str,
) -> Result<Vec<Option<f64>>> {
    let values = rows.column(column)?.str()?;
    let mut coerced = Vec::with_capacity(values.len());
    for (row, cell) in values.into_iter().enumerate() {
        let value = policy
            .apply(cell)
            .map_err(|text| PipelineError::CellRejected {
                station: station.to_string(),
                column: column.to_string(),
                line: lines.get(row).copied().unwrap_or(row + 2),
                value: text.to_string(),
            })?;
        coerced.push(value);
    }
    Ok(coerced)
}
