use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use deltabc_parser::{parse_optional_file, DatedTableParser};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::series::ReconciledDailySeries;

/// How a freshly reconciled block is combined with the rows already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccumulationMode {
    /// Add the block after the existing rows. Re-running duplicates every row.
    Append,
    /// Replace existing rows dated within the block, then add the block.
    #[default]
    Upsert,
}

impl AccumulationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccumulationMode::Append => "append",
            AccumulationMode::Upsert => "upsert",
        }
    }
}

impl fmt::Display for AccumulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccumulationMode {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(AccumulationMode::Append),
            "upsert" => Ok(AccumulationMode::Upsert),
            other => Err(format!("unknown accumulation mode '{other}'")),
        }
    }
}

/// Reads an accumulation file. A file that does not exist yet is empty.
pub fn load_accumulation(path: &Path) -> Result<ReconciledDailySeries> {
    match parse_optional_file(&DatedTableParser, path)? {
        Some(table) => ReconciledDailySeries::from_dated_table(&table),
        None => {
            warn!(path = %path.display(), "accumulation file not found; starting empty");
            Ok(ReconciledDailySeries::default())
        }
    }
}

/// Number of distinct block dates already present in `prior`.
pub fn overlapping_dates(prior: &ReconciledDailySeries, block: &ReconciledDailySeries) -> usize {
    let existing: HashSet<_> = prior.records.iter().map(|record| record.date).collect();
    block
        .records
        .iter()
        .map(|record| record.date)
        .filter(|date| existing.contains(date))
        .collect::<HashSet<_>>()
        .len()
}

pub fn merge(
    prior: ReconciledDailySeries,
    block: &ReconciledDailySeries,
    mode: AccumulationMode,
) -> ReconciledDailySeries {
    let mut records = prior.records;
    if mode == AccumulationMode::Upsert {
        let replaced: HashSet<_> = block.records.iter().map(|record| record.date).collect();
        records.retain(|record| !replaced.contains(&record.date));
    }
    records.extend(block.records.iter().cloned());
    ReconciledDailySeries { records }
}

/// Rewrites the whole file. The new contents land in a temporary file next to
/// `path` first, so a failure never leaves a half-written accumulation file.
pub fn write_accumulation(path: &Path, series: &ReconciledDailySeries) -> Result<()> {
    let io_err = |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err)?;

    let mut df = series.to_dataframe()?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    CsvWriter::new(tmp.as_file_mut())
        .include_header(true)
        .finish(&mut df)?;
    tmp.as_file_mut().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|err| io_err(err.error))?;

    info!(path = %path.display(), rows = series.len(), "accumulation file written");
    Ok(())
}
