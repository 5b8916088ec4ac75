pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::ParserError;
pub use formats::{
    is_missing_token, parse_calendar_date, DatedTableParser, StationCatalogParser,
    WaterQualityParser,
};
pub use model::{
    DatedTable, StationCatalog, StationInfo, WaterQualityTable, DATE_COLUMN, DEPTH_COLUMN,
    STATION_COLUMN,
};
pub use registry::{parse_file, parse_optional_file, TableParser};

#[cfg(test)]
mod tests;
