use crate::errors::ParserError;
use crate::model::{WaterQualityTable, DATE_COLUMN, STATION_COLUMN};
use crate::registry::TableParser;

use super::{csv_reader, find_column, line_of, parse_date, read_header, StringColumns};

/// Loads the wide survey export. Cells are kept as text so the reformatter can
/// echo them unchanged; numeric coercion happens downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaterQualityParser {
    validate_dates: bool,
}

impl WaterQualityParser {
    const NAME: &'static str = "WATER_QUALITY";

    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the file if any `Date` cell is blank or unparseable.
    pub fn with_date_validation(mut self) -> Self {
        self.validate_dates = true;
        self
    }
}

impl TableParser for WaterQualityParser {
    type Output = WaterQualityTable;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &str) -> Result<WaterQualityTable, ParserError> {
        let mut reader = csv_reader(content);
        let names = read_header(Self::NAME, &mut reader)?;
        find_column(Self::NAME, &names, STATION_COLUMN)?;
        let date_idx = find_column(Self::NAME, &names, DATE_COLUMN)?;

        let keep: Vec<usize> = (0..names.len())
            .filter(|idx| !names[*idx].is_empty())
            .collect();
        let mut columns = StringColumns::new(&names, keep);
        let mut lines = Vec::new();

        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|source| ParserError::Csv {
                parser: Self::NAME,
                source,
            })?;
            let line_index = line_of(&record, row_idx + 2);
            if self.validate_dates {
                parse_date(
                    Self::NAME,
                    record.get(date_idx).unwrap_or_default(),
                    line_index,
                )?;
            }
            columns.push_record(&record);
            lines.push(line_index);
        }

        let df = columns.build(Self::NAME)?;
        Ok(WaterQualityTable { df, lines })
    }
}
