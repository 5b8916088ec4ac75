use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use deltabc_core::coverage::StationCoverage;
use deltabc_core::pipelines::TargetSummary;
use deltabc_core::reformatter::ReformatSummary;
use serde::Serialize;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

pub fn print_reformat(summary: &ReformatSummary, json: bool) -> Result<()> {
    if json {
        return print_json(summary);
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Input rows", "Lab rows appended", "Field rows appended"])
        .add_row(vec![
            summary.input_rows.to_string(),
            summary.lab_rows.to_string(),
            summary.field_rows.to_string(),
        ]);
    println!("{table}");
    Ok(())
}

pub fn print_reconcile(summaries: &[TargetSummary], json: bool) -> Result<()> {
    if json {
        return print_json(summaries);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Target",
        "Segments",
        "Days",
        "Days with nutrients",
        "Prior rows",
        "Rows after",
        "Mode",
        "File",
    ]);
    for summary in summaries {
        let segments = summary
            .segments
            .iter()
            .map(|segment| {
                format!(
                    "{} ({} rows, {} to {})",
                    segment.station,
                    segment.rows,
                    or_dash(segment.first_date),
                    or_dash(segment.last_date)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let file = if summary.written {
            summary.accumulation_path.display().to_string()
        } else {
            format!("{} (not written)", summary.accumulation_path.display())
        };
        table.add_row(vec![
            summary.name.clone(),
            segments,
            summary.reconciled_rows.to_string(),
            summary.days_with_nutrients.to_string(),
            summary.prior_rows.to_string(),
            summary.accumulated_rows.to_string(),
            summary.mode.to_string(),
            file,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn print_coverage(coverage: &[StationCoverage], json: bool) -> Result<()> {
    if json {
        return print_json(coverage);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Station",
        "Latitude",
        "Longitude",
        "Rows",
        "First sample",
        "Last sample",
    ]);
    for entry in coverage {
        table.add_row(vec![
            entry.station.clone(),
            or_dash(entry.latitude),
            or_dash(entry.longitude),
            entry.rows.to_string(),
            or_dash(entry.first_date),
            or_dash(entry.last_date),
        ]);
    }
    println!("{table}");
    Ok(())
}
