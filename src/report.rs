use std::{borrow::Cow, fmt::Write as _};

use chrono::Utc;
use serde_json::{Value as JsonValue, json};

use crate::{
    compare::ComparisonOutcome,
    data::{CellValue, Row},
    diff::{ComparisonResult, RowStatus},
};

const CELL_SEPARATOR: &str = "  ";
const CHANGE_ARROW: &str = " => ";

pub fn status_marker(status: RowStatus) -> &'static str {
    match status {
        RowStatus::Same => "=",
        RowStatus::Different => "~",
        RowStatus::LeftOnly => "<",
        RowStatus::RightOnly => ">",
    }
}

/// Plain-text table: one line per aligned pair plus a summary line.
pub fn render_comparison(outcome: &ComparisonOutcome, only_differences: bool) -> String {
    let mut headers = vec!["#".to_string(), "status".to_string()];
    headers.extend(outcome.columns.iter().cloned());

    let rows = visible(&outcome.results, only_differences)
        .map(|result| {
            let mut cells = vec![
                (result.index + 1).to_string(),
                status_marker(result.status).to_string(),
            ];
            cells.extend(
                outcome
                    .columns
                    .iter()
                    .map(|column| render_cell(outcome, result, column)),
            );
            cells
        })
        .collect::<Vec<_>>();

    let mut output = render_table(&headers, &rows);
    let summary = &outcome.summary;
    let _ = writeln!(
        output,
        "{} same, {} different, {} left-only, {} right-only",
        summary.same, summary.different, summary.left_only, summary.right_only
    );
    for dropped in &outcome.dropped {
        let _ = writeln!(
            output,
            "dropped {} virtual column '{}': {}",
            dropped.column.side(),
            dropped.column.name(),
            dropped.reason
        );
    }
    output
}

fn visible(
    results: &[ComparisonResult],
    only_differences: bool,
) -> impl Iterator<Item = &ComparisonResult> {
    results
        .iter()
        .filter(move |result| !only_differences || result.status != RowStatus::Same)
}

fn render_cell(outcome: &ComparisonOutcome, result: &ComparisonResult, column: &str) -> String {
    let left = resolved(outcome, result.index, true, column);
    let right = resolved(outcome, result.index, false, column);
    match result.status {
        RowStatus::RightOnly => right,
        RowStatus::Different if result.diff_columns.iter().any(|c| c == column) => {
            format!("{left}{CHANGE_ARROW}{right} *")
        }
        _ => left,
    }
}

fn resolved(outcome: &ComparisonOutcome, index: usize, left: bool, column: &str) -> String {
    let rows = if left {
        &outcome.resolved.left
    } else {
        &outcome.resolved.right
    };
    rows.get(index)
        .and_then(|row| row.get(column))
        .map(display_cell)
        .unwrap_or_default()
}

fn display_cell(value: &CellValue) -> String {
    match value {
        CellValue::Null => "(null)".to_string(),
        other => other.as_display(),
    }
}

/// JSON report with per-row entries and the run summary.
pub fn json_report(outcome: &ComparisonOutcome, only_differences: bool) -> JsonValue {
    let entries = visible(&outcome.results, only_differences)
        .map(|result| {
            json!({
                "index": result.index,
                "status": result.status,
                "diffColumns": result.diff_columns,
                "left": result
                    .left_row
                    .as_ref()
                    .and_then(|_| outcome.resolved.left.get(result.index))
                    .map(|row| project(row, &outcome.columns)),
                "right": result
                    .right_row
                    .as_ref()
                    .and_then(|_| outcome.resolved.right.get(result.index))
                    .map(|row| project(row, &outcome.columns)),
            })
        })
        .collect::<Vec<_>>();
    json!({
        "generatedAt": Utc::now().to_rfc3339(),
        "columns": outcome.columns,
        "summary": outcome.summary,
        "filteredOut": {
            "left": outcome.left_filtered_out,
            "right": outcome.right_filtered_out,
        },
        "droppedVirtualColumns": outcome.dropped,
        "rows": entries,
    })
}

fn project(row: &Row, columns: &[String]) -> JsonValue {
    let mut map = serde_json::Map::new();
    for column in columns {
        let value = row
            .get(column)
            .map(CellValue::to_canonical_json)
            .unwrap_or(JsonValue::Null);
        map.insert(column.clone(), value);
    }
    JsonValue::Object(map)
}

/// Left-aligned columns separated by two spaces, with a dashed rule under the header.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| char_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(char_width(&flatten(cell)));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", join_padded(headers, &widths));
    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", rule.join(CELL_SEPARATOR));
    for row in rows {
        let _ = writeln!(output, "{}", join_padded(row, &widths));
    }
    output
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let text = flatten(cell);
            let padding = width.saturating_sub(char_width(&text));
            format!("{text}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(CELL_SEPARATOR);
    line.trim_end().to_string()
}

fn char_width(value: &str) -> usize {
    value.chars().count()
}

/// Multi-line cells (reference labels) print on one line.
fn flatten(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace("\r\n", " ").replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
