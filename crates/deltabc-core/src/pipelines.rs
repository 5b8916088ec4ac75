use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use deltabc_parser::{
    parse_file, DatedTableParser, StationCatalog, StationCatalogParser, WaterQualityParser,
    WaterQualityTable,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::accumulation::{self, AccumulationMode};
use crate::calendar::{reconcile_daily, DailyCalendar, DuplicateDates};
use crate::config::{DeltaConfig, SegmentWindow, TargetConfig};
use crate::coverage::{station_coverage, StationCoverage};
use crate::error::{PipelineError, Result};
use crate::nutrients::derive_segment;
use crate::reformatter::{self, ReformatSummary};
use crate::series::{DerivedNutrientSeries, FlowSeries, ReconciledDailySeries};

/// Inputs of a reconcile run, loaded once and shared by every target.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub water_quality: WaterQualityTable,
    pub catalog: StationCatalog,
    pub flows: HashMap<String, FlowSeries>,
}

impl ExecutionContext {
    pub fn load(config: &DeltaConfig, targets: &[&TargetConfig]) -> Result<Self> {
        let wq_path = config.source_path(&config.reconcile.water_quality);
        info!(path = %wq_path.display(), "loading water quality table");
        let water_quality = parse_file(&WaterQualityParser::new().with_date_validation(), &wq_path)?;

        let catalog_path = config.source_path(&config.reconcile.stations);
        let catalog = parse_file(&StationCatalogParser, &catalog_path)?;

        let mut flows = HashMap::new();
        for target in targets {
            let flow_path = config.source_path(&target.flow);
            let table = parse_file(&DatedTableParser, &flow_path)?;
            let flow = FlowSeries::from_table(&table, target.flow_column.as_deref())?;
            info!(target = %target.name, days = flow.len(), "flow series loaded");
            flows.insert(target.name.clone(), flow);
        }

        Ok(Self {
            water_quality,
            catalog,
            flows,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub station: String,
    pub window: SegmentWindow,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub segments: Vec<SegmentSummary>,
    pub nutrients: DerivedNutrientSeries,
    pub daily: ReconciledDailySeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetSummary {
    pub name: String,
    pub segments: Vec<SegmentSummary>,
    pub calendar_start: NaiveDate,
    pub calendar_end: NaiveDate,
    pub calendar_days: usize,
    pub reconciled_rows: usize,
    pub days_with_nutrients: usize,
    pub prior_rows: usize,
    pub accumulated_rows: usize,
    pub mode: AccumulationMode,
    pub accumulation_path: PathBuf,
    pub written: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Only this target; all targets when `None`.
    pub target: Option<String>,
    /// Overrides the configured accumulation mode.
    pub mode: Option<AccumulationMode>,
    /// Compute everything but write nothing.
    pub dry_run: bool,
}

/// Builds one target's gap-filled daily series from already loaded inputs.
pub fn reconcile_target(
    water_quality: &WaterQualityTable,
    catalog: &StationCatalog,
    calendar: &DailyCalendar,
    flow: &FlowSeries,
    target: &TargetConfig,
    duplicates: DuplicateDates,
) -> Result<TargetOutcome> {
    let mut segments = Vec::with_capacity(target.segments.len());
    let mut derived = Vec::with_capacity(target.segments.len());

    for segment in &target.segments {
        if !catalog.contains(&segment.station) {
            return Err(PipelineError::UnknownStation {
                station: segment.station.clone(),
            });
        }
        let series = derive_segment(water_quality, segment)?;
        segments.push(SegmentSummary {
            station: segment.station.clone(),
            window: segment.window,
            rows: series.len(),
            first_date: series.samples.first().map(|sample| sample.date),
            last_date: series.samples.last().map(|sample| sample.date),
        });
        derived.push(series);
    }

    let nutrients = DerivedNutrientSeries::concat(derived);
    let daily = reconcile_daily(calendar, flow, &nutrients, duplicates);
    info!(
        target = %target.name,
        samples = nutrients.len(),
        rows = daily.len(),
        "target reconciled"
    );

    Ok(TargetOutcome {
        segments,
        nutrients,
        daily,
    })
}

fn select_targets<'a>(
    config: &'a DeltaConfig,
    only: Option<&str>,
) -> Result<Vec<&'a TargetConfig>> {
    match only {
        Some(name) => config
            .target(name)
            .map(|target| vec![target])
            .ok_or_else(|| PipelineError::Config(format!("no target named '{name}'"))),
        None => Ok(config.reconcile.targets.iter().collect()),
    }
}

/// Reconciles every selected target, then rewrites their accumulation files.
/// Nothing is written until all targets have been computed and merged.
pub fn run_reconcile(config: &DeltaConfig, options: &ReconcileOptions) -> Result<Vec<TargetSummary>> {
    config.validate()?;
    let targets = select_targets(config, options.target.as_deref())?;
    let context = ExecutionContext::load(config, &targets)?;
    let calendar = DailyCalendar::new(config.reconcile.calendar.start, config.reconcile.calendar.end)?;
    let mode = options.mode.unwrap_or(config.reconcile.accumulation_mode);
    info!(
        start = %calendar.start(),
        end = %calendar.end(),
        days = calendar.len(),
        %mode,
        "reconciling targets"
    );

    let mut pending = Vec::with_capacity(targets.len());
    for target in targets {
        let flow = context
            .flows
            .get(&target.name)
            .ok_or_else(|| PipelineError::Config(format!("flow for '{}' not loaded", target.name)))?;
        let outcome = reconcile_target(
            &context.water_quality,
            &context.catalog,
            &calendar,
            flow,
            target,
            config.reconcile.duplicate_dates,
        )?;

        let path = config.intermediate_path(&target.accumulation);
        let prior = accumulation::load_accumulation(&path)?;
        let prior_rows = prior.len();
        if mode == AccumulationMode::Append {
            let overlap = accumulation::overlapping_dates(&prior, &outcome.daily);
            if overlap > 0 {
                warn!(
                    target = %target.name,
                    dates = overlap,
                    "append mode is duplicating dates already accumulated"
                );
            }
        }
        let merged = accumulation::merge(prior, &outcome.daily, mode);

        let summary = TargetSummary {
            name: target.name.clone(),
            segments: outcome.segments,
            calendar_start: calendar.start(),
            calendar_end: calendar.end(),
            calendar_days: calendar.len(),
            reconciled_rows: outcome.daily.len(),
            days_with_nutrients: outcome
                .daily
                .records
                .iter()
                .filter(|record| record.ammonia.is_some() || record.nitrate_nitrite.is_some())
                .count(),
            prior_rows,
            accumulated_rows: merged.len(),
            mode,
            accumulation_path: path.clone(),
            written: false,
        };
        pending.push((summary, path, merged));
    }

    let mut summaries = Vec::with_capacity(pending.len());
    for (mut summary, path, merged) in pending {
        if options.dry_run {
            info!(target = %summary.name, "dry run; accumulation file left unchanged");
        } else {
            accumulation::write_accumulation(&path, &merged)?;
            summary.written = true;
        }
        summaries.push(summary);
    }

    Ok(summaries)
}

/// Reformats the wide survey export and appends both long-format outputs.
pub fn run_reformat(config: &DeltaConfig) -> Result<ReformatSummary> {
    let input = config.source_path(&config.reformat.input);
    info!(path = %input.display(), "loading survey export for reformat");
    let table = parse_file(&WaterQualityParser::new(), &input)?;

    let rendered = reformatter::render(&table, &config.reformat.program_label)?;
    reformatter::append_outputs(
        &rendered,
        &config.source_path(&config.reformat.lab_output),
        &config.source_path(&config.reformat.field_output),
    )?;

    Ok(ReformatSummary {
        input_rows: table.height(),
        lab_rows: rendered.lab_rows,
        field_rows: rendered.field_rows,
    })
}

pub fn run_coverage(config: &DeltaConfig, since: Option<NaiveDate>) -> Result<Vec<StationCoverage>> {
    let table = parse_file(
        &WaterQualityParser::new().with_date_validation(),
        &config.source_path(&config.reconcile.water_quality),
    )?;
    let catalog = parse_file(
        &StationCatalogParser,
        &config.source_path(&config.reconcile.stations),
    )?;
    station_coverage(&catalog, &table, since)
}
