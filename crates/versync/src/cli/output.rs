//! Output formatting utilities for CLI commands
//!
//! Tables for humans, `serde_json::Value` documents for `--json`.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use serde_json::{json, Value};
use versync_stores::{BatchResult, BatchStatus, StoreOutcome, StoreReport, ValidationErrors};

/// Print a JSON document on stdout.
pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a table with custom column colors
pub fn print_table_colored(headers: &[&str], rows: Vec<Vec<(String, Option<Color>)>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect();
    table.set_header(header_cells);

    for row in rows {
        let cells: Vec<Cell> = row
            .into_iter()
            .map(|(text, color)| match color {
                Some(c) => Cell::new(text).fg(c),
                None => Cell::new(text),
            })
            .collect();
        table.add_row(cells);
    }

    println!("{}", table);
}

/// Display color for a store outcome
pub fn outcome_color(outcome: &StoreOutcome) -> Option<Color> {
    match outcome {
        StoreOutcome::Committed(_) => Some(Color::Green),
        StoreOutcome::Planned(_) => Some(Color::Yellow),
        StoreOutcome::Failed { .. } => Some(Color::Red),
        StoreOutcome::NotAttempted => Some(Color::Grey),
    }
}

fn outcome_detail(outcome: &StoreOutcome) -> String {
    match outcome {
        StoreOutcome::Committed(change) if change.changed => "written".to_string(),
        StoreOutcome::Committed(_) => "already up to date".to_string(),
        StoreOutcome::Planned(change) if change.changed => "would change".to_string(),
        StoreOutcome::Planned(_) => "already up to date".to_string(),
        StoreOutcome::Failed { phase, error } => format!("{} failed: {}", phase, error),
        StoreOutcome::NotAttempted => "-".to_string(),
    }
}

/// Human-readable batch summary.
pub fn print_batch(result: &BatchResult) {
    if result.stores.is_empty() {
        println!("No version stores declared; nothing to do.");
        return;
    }

    let headers = &["PATH", "KIND", "OUTCOME", "DETAIL"];
    let rows: Vec<Vec<(String, Option<Color>)>> = result
        .stores
        .iter()
        .map(|report| {
            vec![
                (report.path.to_string(), None),
                (report.kind.to_string(), None),
                (report.outcome.as_str().to_string(), outcome_color(&report.outcome)),
                (outcome_detail(&report.outcome), None),
            ]
        })
        .collect();
    print_table_colored(headers, rows);

    let summary = match result.status {
        BatchStatus::Committed => format!("Version {} written to all stores.", result.version),
        BatchStatus::Planned => format!("Dry run: version {} not written.", result.version),
        BatchStatus::RolledBack if result.cancelled => "Cancelled before writing; no store was modified.".to_string(),
        BatchStatus::RolledBack => "Batch rolled back; no store was modified.".to_string(),
        BatchStatus::Degraded => format!(
            "Some writes failed: {} of {} store(s) were not written. Re-run after fixing the failures.",
            result.failures().count(),
            result.stores.len()
        ),
    };
    println!("{}", summary);
}

/// JSON document for a batch result.
pub fn batch_json(result: &BatchResult) -> Value {
    json!({
        "version": result.version.as_str(),
        "status": result.status.as_str(),
        "cancelled": result.cancelled,
        "stores": result.stores.iter().map(report_json).collect::<Vec<_>>(),
    })
}

fn report_json(report: &StoreReport) -> Value {
    let mut value = json!({
        "path": report.path.as_str(),
        "kind": report.kind.as_str(),
        "outcome": report.outcome.as_str(),
    });
    match &report.outcome {
        StoreOutcome::Committed(change) | StoreOutcome::Planned(change) => {
            value["old_hash"] = json!(change.old_hash);
            value["changed"] = json!(change.changed);
            if matches!(report.outcome, StoreOutcome::Planned(_)) {
                value["new_content"] = json!(change.new_content);
            }
        }
        StoreOutcome::Failed { phase, error } => {
            value["phase"] = json!(phase.as_str());
            value["error"] = json!({
                "kind": error.kind(),
                "message": error.to_string(),
            });
        }
        StoreOutcome::NotAttempted => {}
    }
    value
}

/// JSON array of validation violations.
pub fn violations_json(errors: &ValidationErrors) -> Value {
    Value::Array(
        errors
            .iter()
            .map(|e| {
                json!({
                    "path": e.instance_path,
                    "expected": e.expected,
                    "actual": e.actual,
                })
            })
            .collect(),
    )
}
