mod common;
mod dated;
mod stations;
mod water_quality;

pub use common::{is_missing_token, parse_calendar_date, MISSING_TOKENS};
pub use dated::DatedTableParser;
pub use stations::StationCatalogParser;
pub use water_quality::WaterQualityParser;

pub(crate) use common::{
    csv_reader, find_column, line_of, parse_date, parse_optional_f64, read_header, StringColumns,
};
