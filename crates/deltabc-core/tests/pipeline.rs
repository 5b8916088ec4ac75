use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use deltabc_core::accumulation::{load_accumulation, AccumulationMode};
use deltabc_core::calendar::{DailyCalendar, DuplicateDates};
use deltabc_core::config::{CalendarConfig, DeltaConfig, SegmentConfig, SegmentWindow, TargetConfig};
use deltabc_core::error::PipelineError;
use deltabc_core::pipelines::{
    reconcile_target, run_coverage, run_reconcile, run_reformat, ReconcileOptions,
};
use deltabc_core::series::FlowSeries;
use deltabc_parser::{StationCatalogParser, TableParser, WaterQualityParser};

const STATIONS: &str = "\
Station,Location,Latitude,Longitude
D24,Sacramento River below Rio Vista Bridge,38.157,-121.681
D22,Sacramento River at Emmaton,38.084,-121.739
D26,San Joaquin River at Potato Point,38.077,-121.567
C10,San Joaquin River near Vernalis,37.678,-121.265
";

const SAC_FLOW: &str = "\
Date,Flow
2017-01-09,21000
2017-01-10,23500
2017-01-11,
2017-01-12,26000
";

const SJ_FLOW: &str = "\
Date,Flow
2017-01-09,3100
2017-01-10,3200
2017-01-11,3300
2017-01-12,3400
";

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
}

/// Lays out sources and intermediate directories under `root`.
fn workspace(root: &Path, stations: &str) -> Result<DeltaConfig> {
    let sources = root.join("sources");
    std::fs::create_dir_all(&sources)?;
    let sample = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../deltabc-parser/tests/data/SACSJ_sample.csv");
    std::fs::copy(&sample, sources.join("wq.csv"))?;
    std::fs::write(sources.join("stations.csv"), stations)?;
    std::fs::write(sources.join("sac_flow.csv"), SAC_FLOW)?;
    std::fs::write(sources.join("sj_flow.csv"), SJ_FLOW)?;

    let mut config = DeltaConfig::default();
    config.paths.sources_dir = sources;
    config.paths.intermediate_dir = root.join("intermediate");
    config.reformat.input = "wq.csv".to_string();
    config.reconcile.water_quality = "wq.csv".to_string();
    config.reconcile.stations = "stations.csv".to_string();
    config.reconcile.calendar = CalendarConfig {
        start: date("2017-01-09"),
        end: date("2017-01-12"),
    };
    Ok(config)
}

#[test]
fn reconcile_writes_one_file_per_target() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = workspace(dir.path(), STATIONS)?;

    let summaries = run_reconcile(&config, &ReconcileOptions::default())?;
    assert_eq!(summaries.len(), 2);
    assert!(summaries.iter().all(|summary| summary.written));
    assert_eq!(summaries[0].segments.len(), 2);
    assert_eq!(summaries[0].segments[1].rows, 2);
    assert_eq!(summaries[0].calendar_start, date("2017-01-09"));
    assert_eq!(summaries[0].calendar_end, date("2017-01-12"));
    assert_eq!(summaries[0].calendar_days, 4);

    let sac = load_accumulation(&config.intermediate_path("false_sac.csv"))?;
    assert_eq!(sac.len(), 4);
    assert_eq!(sac.records[0].flow, Some(21000.0));
    assert_eq!(sac.records[0].ammonia, None);
    assert_eq!(sac.records[1].date, date("2017-01-10"));
    assert!(sac.records[1].ammonia.is_some_and(|value| (value - 0.4).abs() < 1e-9));
    assert_eq!(sac.records[2].flow, None);

    let sj = load_accumulation(&config.intermediate_path("false_sj.csv"))?;
    assert_eq!(sj.len(), 4);
    assert_eq!(sj.records[2].ammonia, Some(0.0));
    assert_eq!(sj.records[2].nitrate_nitrite, Some(1.1));
    assert_eq!(sj.records[2].flow, Some(3300.0));
    Ok(())
}

#[test]
fn rerun_upserts_by_default_and_appends_on_request() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = workspace(dir.path(), STATIONS)?;
    let path = config.intermediate_path("false_sj.csv");

    run_reconcile(&config, &ReconcileOptions::default())?;
    run_reconcile(&config, &ReconcileOptions::default())?;
    assert_eq!(load_accumulation(&path)?.len(), 4);

    let append = ReconcileOptions {
        target: Some("san_joaquin".to_string()),
        mode: Some(AccumulationMode::Append),
        dry_run: false,
    };
    let summaries = run_reconcile(&config, &append)?;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].prior_rows, 4);
    assert_eq!(summaries[0].accumulated_rows, 8);
    assert_eq!(load_accumulation(&path)?.len(), 8);
    Ok(())
}

#[test]
fn dry_run_leaves_files_untouched() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = workspace(dir.path(), STATIONS)?;

    let options = ReconcileOptions {
        dry_run: true,
        ..ReconcileOptions::default()
    };
    let summaries = run_reconcile(&config, &options)?;
    assert!(summaries.iter().all(|summary| !summary.written));
    assert!(!config.intermediate_path("false_sac.csv").exists());
    assert!(!config.intermediate_path("false_sj.csv").exists());
    Ok(())
}

#[test]
fn failing_target_prevents_every_write() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let without_d26 = STATIONS
        .lines()
        .filter(|line| !line.starts_with("D26"))
        .collect::<Vec<_>>()
        .join("\n");
    let config = workspace(dir.path(), &without_d26)?;

    let err = run_reconcile(&config, &ReconcileOptions::default()).unwrap_err();
    assert!(matches!(err, PipelineError::UnknownStation { ref station } if station == "D26"));
    assert!(!config.intermediate_path("false_sac.csv").exists());
    Ok(())
}

#[test]
fn unknown_target_name_is_a_config_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = workspace(dir.path(), STATIONS)?;
    let options = ReconcileOptions {
        target: Some("american".to_string()),
        ..ReconcileOptions::default()
    };
    let err = run_reconcile(&config, &options).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    Ok(())
}

#[test]
fn reformat_appends_to_both_outputs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = workspace(dir.path(), STATIONS)?;

    let summary = run_reformat(&config)?;
    assert_eq!(summary.input_rows, 5);
    assert_eq!(summary.lab_rows, 50);
    assert_eq!(summary.field_rows, 30);

    run_reformat(&config)?;
    let lab = std::fs::read_to_string(config.source_path("EMP_Lab_updated.csv"))?;
    let field = std::fs::read_to_string(config.source_path("EMP_Field_updated.csv"))?;
    assert_eq!(lab.lines().count(), 100);
    assert_eq!(field.lines().count(), 60);
    Ok(())
}

#[test]
fn coverage_lists_catalog_stations_with_recent_samples() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = workspace(dir.path(), STATIONS)?;

    let all = run_coverage(&config, None)?;
    let stations: Vec<&str> = all.iter().map(|entry| entry.station.as_str()).collect();
    assert_eq!(stations, vec!["D24", "D22", "D26", "C10"]);
    assert_eq!(all[0].first_date, Some(date("2016-01-12")));
    assert_eq!(all[0].last_date, Some(date("2016-02-09")));
    assert_eq!(all[0].rows, 2);
    assert_eq!(all[3].rows, 0);
    assert_eq!(all[3].last_date, None);

    let recent = run_coverage(&config, Some(date("2017-01-01")))?;
    let stations: Vec<&str> = recent.iter().map(|entry| entry.station.as_str()).collect();
    assert_eq!(stations, vec!["D22", "D26"]);
    assert_eq!(recent[1].latitude, Some(38.077));
    Ok(())
}

#[test]
fn later_tail_segment_overrides_the_full_segment_on_shared_days() -> Result<()> {
    let mut content = String::from("Station,Date,TKN,DON,DissNitrateNitrite,DissOrthoPhos\n");
    for day in 1..=20 {
        content.push_str(&format!("D24,2017-01-{day:02},5.0,1.0,0.3,0.05\n"));
    }
    for day in 1..=20 {
        content.push_str(&format!("D22,2017-01-{day:02},10.0,1.0,0.6,0.08\n"));
    }
    let table = WaterQualityParser::new().with_date_validation().parse(&content)?;
    let catalog = StationCatalogParser.parse(STATIONS)?;
    let calendar = DailyCalendar::new(date("2017-01-01"), date("2017-01-20"))?;
    let target = TargetConfig {
        name: "sacramento".to_string(),
        flow: "sac_flow.csv".to_string(),
        flow_column: None,
        accumulation: "false_sac.csv".to_string(),
        segments: vec![
            SegmentConfig::new("D24", SegmentWindow::Full),
            SegmentConfig::new("D22", SegmentWindow::Tail { rows: 12 }),
        ],
    };

    let outcome = reconcile_target(
        &table,
        &catalog,
        &calendar,
        &FlowSeries::default(),
        &target,
        DuplicateDates::PreferLater,
    )?;

    assert_eq!(outcome.segments[1].rows, 12);
    assert_eq!(outcome.segments[1].first_date, Some(date("2017-01-09")));
    assert_eq!(outcome.nutrients.len(), 32);
    assert_eq!(outcome.daily.len(), 20);

    let ammonia: Vec<Option<f64>> = outcome.daily.records.iter().map(|r| r.ammonia).collect();
    let mut expected = vec![Some(4.0); 8];
    expected.extend(vec![Some(9.0); 12]);
    assert_eq!(ammonia, expected);
    assert_eq!(outcome.daily.records[7].nitrate_nitrite, Some(0.3));
    assert_eq!(outcome.daily.records[8].nitrate_nitrite, Some(0.6));
    assert_eq!(outcome.daily.records[19].orthophosphate, Some(0.08));
    Ok(())
}
