use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::errors::ParserError;
use crate::formats::{parse_calendar_date, DatedTableParser, StationCatalogParser, WaterQualityParser};
use crate::registry::{parse_optional_file, TableParser};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn parses_wide_water_quality_table() {
    let content = fixture("SACSJ_sample.csv");
    let table = WaterQualityParser::new()
        .with_date_validation()
        .parse(&content)
        .expect("water quality parse failed");

    assert_eq!(table.height(), 5);
    assert!(table.has_column("DissNitrateNitrite"));
    assert!(table.has_column("SpCndSurface"));
    assert_eq!(
        table.station_codes().unwrap(),
        vec!["D24".to_string(), "D22".to_string(), "D26".to_string()]
    );

    let don = table.text_column("DON").unwrap();
    assert_eq!(don.get(2), Some("ND"));

    let tss = table.text_column("TSS").unwrap();
    assert_eq!(tss.get(2), None);
}

#[test]
fn station_rows_keep_file_order() {
    let content = fixture("SACSJ_sample.csv");
    let table = WaterQualityParser::new().parse(&content).unwrap();

    let rows = table.station_rows("D24").unwrap();
    assert_eq!(rows.height(), 2);
    let dates = rows.column("Date").unwrap().str().unwrap();
    assert_eq!(dates.get(0), Some("2016-01-12"));
    assert_eq!(dates.get(1), Some("2016-02-09"));

    let none = table.station_rows("C3A").unwrap();
    assert_eq!(none.height(), 0);
}

#[test]
fn station_lines_point_back_into_the_file() {
    let content = fixture("SACSJ_sample.csv");
    let table = WaterQualityParser::new().parse(&content).unwrap();

    assert_eq!(table.line(0), 2);
    assert_eq!(table.station_lines("D22").unwrap(), vec![4, 5]);
    assert_eq!(table.station_lines("D26").unwrap(), vec![6]);
    assert!(table.station_lines("C3A").unwrap().is_empty());
}

#[test]
fn water_quality_requires_station_and_date() {
    let err = WaterQualityParser::new()
        .parse("Depth,Date,TKN\n3,2017-01-01,0.4\n")
        .unwrap_err();
    match err {
        ParserError::MissingColumn { ref column, .. } => {
            assert_eq!(column, "Station");
            assert_eq!(err.parser(), "WATER_QUALITY");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn date_validation_reports_line() {
    let content = "Station,Depth,Date,TKN\nD22,3,2017-01-10,0.4\nD22,3,not-a-date,0.5\n";
    let err = WaterQualityParser::new()
        .with_date_validation()
        .parse(content)
        .unwrap_err();
    match err {
        ParserError::InvalidDate {
            line_index, value, ..
        } => {
            assert_eq!(line_index, 3);
            assert_eq!(value, "not-a-date");
        }
        other => panic!("unexpected error {other:?}"),
    }

    // Without validation the raw text is simply carried along.
    let table = WaterQualityParser::new().parse(content).unwrap();
    assert_eq!(table.height(), 2);
}

#[test]
fn duplicate_header_is_rejected() {
    let err = WaterQualityParser::new()
        .parse("Station,Date,TKN,TKN\nD22,2017-01-10,0.4,0.4\n")
        .unwrap_err();
    assert!(matches!(err, ParserError::DuplicateColumn { .. }));
}

#[test]
fn parses_station_catalog() {
    let content = "Station,Latitude,Longitude\nD22,38.0,-121.7\nD24,38.1,\n";
    let catalog = StationCatalogParser.parse(content).unwrap();

    assert_eq!(catalog.len(), 2);
    assert!(catalog.contains("D24"));
    assert!(!catalog.contains("D26"));
    let d24 = catalog.get("D24").unwrap();
    assert_eq!(d24.latitude, Some(38.1));
    assert_eq!(d24.longitude, None);
}

#[test]
fn empty_station_catalog_is_an_error() {
    let err = StationCatalogParser.parse("Station,Latitude,Longitude\n").unwrap_err();
    assert!(matches!(err, ParserError::EmptyData { .. }));
}

#[test]
fn dated_table_skips_leading_index_column() {
    let content = ",Date,flow ft3/s,NH3 mg/L N\n0,2016-10-01,12000.5,0.1\n1,2016-10-02,,NaN\n";
    let table = DatedTableParser.parse(content).unwrap();

    assert_eq!(table.dates, vec![ymd(2016, 10, 1), ymd(2016, 10, 2)]);
    assert_eq!(
        table.value_column_names(),
        vec!["flow ft3/s".to_string(), "NH3 mg/L N".to_string()]
    );
    assert_eq!(
        table.numeric_column("flow ft3/s").unwrap(),
        vec![Some(12000.5), None]
    );
    assert_eq!(table.numeric_column("NH3 mg/L N").unwrap(), vec![Some(0.1), None]);
}

#[test]
fn dated_table_rejects_text_in_numeric_column() {
    let table = DatedTableParser
        .parse("Date,flow\n2016-10-01,12000\n2016-10-02,ice\n")
        .unwrap();
    let err = table.numeric_column("flow").unwrap_err();
    match err {
        ParserError::DataRow { line_index, .. } => assert_eq!(line_index, 3),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(matches!(
        table.numeric_column("stage"),
        Err(ParserError::MissingColumn { .. })
    ));
}

#[test]
fn calendar_dates_accept_common_layouts() {
    assert_eq!(parse_calendar_date("2016-10-01"), Some(ymd(2016, 10, 1)));
    assert_eq!(parse_calendar_date("10/01/2016"), Some(ymd(2016, 10, 1)));
    assert_eq!(
        parse_calendar_date("2017-01-10 10:35:00"),
        Some(ymd(2017, 1, 10))
    );
    assert_eq!(parse_calendar_date("2017-13-10"), None);
    assert_eq!(parse_calendar_date(""), None);
}

#[test]
fn missing_file_parses_as_none() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/does_not_exist.csv");
    let parsed = parse_optional_file(&DatedTableParser, &path).unwrap();
    assert!(parsed.is_none());
}
