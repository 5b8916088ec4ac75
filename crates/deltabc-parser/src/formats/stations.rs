use crate::errors::ParserError;
use crate::model::{
    StationCatalog, StationInfo, LATITUDE_COLUMN, LONGITUDE_COLUMN, STATION_COLUMN,
};
use crate::registry::TableParser;

use super::{csv_reader, find_column, line_of, parse_optional_f64, read_header};

#[derive(Debug, Clone, Copy, Default)]
pub struct StationCatalogParser;

impl StationCatalogParser {
    const NAME: &'static str = "STATION_CATALOG";
}

impl TableParser for StationCatalogParser {
    type Output = StationCatalog;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &str) -> Result<StationCatalog, ParserError> {
        let mut reader = csv_reader(content);
        let names = read_header(Self::NAME, &mut reader)?;
        let station_idx = find_column(Self::NAME, &names, STATION_COLUMN)?;
        let lat_idx = names.iter().position(|name| name == LATITUDE_COLUMN);
        let lon_idx = names.iter().position(|name| name == LONGITUDE_COLUMN);

        let mut stations = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|source| ParserError::Csv {
                parser: Self::NAME,
                source,
            })?;
            let line_index = line_of(&record, row_idx + 2);

            let code = record.get(station_idx).unwrap_or_default().trim();
            if code.is_empty() {
                return Err(ParserError::DataRow {
                    parser: Self::NAME,
                    line_index,
                    message: "station code is blank".to_string(),
                });
            }

            let latitude = match lat_idx.and_then(|idx| record.get(idx)) {
                Some(value) => parse_optional_f64(Self::NAME, value, line_index, LATITUDE_COLUMN)?,
                None => None,
            };
            let longitude = match lon_idx.and_then(|idx| record.get(idx)) {
                Some(value) => parse_optional_f64(Self::NAME, value, line_index, LONGITUDE_COLUMN)?,
                None => None,
            };

            stations.push(StationInfo {
                code: code.to_string(),
                latitude,
                longitude,
            });
        }

        if stations.is_empty() {
            return Err(ParserError::EmptyData { parser: Self::NAME });
        }

        Ok(StationCatalog { stations })
    }
}
