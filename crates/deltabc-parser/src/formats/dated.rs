use crate::errors::ParserError;
use crate::model::{DatedTable, DATE_COLUMN};
use crate::registry::TableParser;

use super::{csv_reader, find_column, line_of, parse_date, read_header, StringColumns};

/// Loads any `Date`-keyed table: river flow exports and accumulation files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatedTableParser;

impl TableParser for DatedTableParser {
    type Output = DatedTable;

    fn name(&self) -> &'static str {
        DatedTable::PARSER
    }

    fn parse(&self, content: &str) -> Result<DatedTable, ParserError> {
        let parser = DatedTable::PARSER;
        let mut reader = csv_reader(content);
        let names = read_header(parser, &mut reader)?;
        let date_idx = find_column(parser, &names, DATE_COLUMN)?;

        let keep: Vec<usize> = (0..names.len())
            .filter(|idx| *idx != date_idx && !names[*idx].is_empty())
            .collect();
        let mut columns = StringColumns::new(&names, keep);
        let mut dates = Vec::new();
        let mut lines = Vec::new();

        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|source| ParserError::Csv { parser, source })?;
            let line_index = line_of(&record, row_idx + 2);
            let date = parse_date(parser, record.get(date_idx).unwrap_or_default(), line_index)?;
            dates.push(date);
            lines.push(line_index);
            columns.push_record(&record);
        }

        let values = columns.build(parser)?;
        Ok(DatedTable {
            dates,
            values,
            lines,
        })
    }
}
