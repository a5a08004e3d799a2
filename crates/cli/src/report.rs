//! Human-readable summary printed to stderr after `runcmp compare`.

use runcmp_compare::{ComparisonResult, MeasureValue, SuiteResult, TableStatus};

/// Render every pair of a suite, baseline first.
pub fn render_suite(suite: &SuiteResult) -> String {
    let mut out = format!(
        "baseline {}: {} of {} comparisons differ, {} tables with differences, {} differing cells\n",
        suite.baseline_run_id,
        suite.overall.pairs_with_differences,
        suite.overall.pairs_compared,
        suite.overall.tables_with_differences,
        suite.overall.cells_differing,
    );
    for comparison in &suite.comparisons {
        out.push('\n');
        out.push_str(&render_comparison(comparison));
    }
    out
}

/// Headline, missing tables, per-table overview and top deviations for one pair.
pub fn render_comparison(result: &ComparisonResult) -> String {
    let overall = &result.summary_stats.overall;
    let mut out = format!(
        "{}: {} tables compared, {} with differences, {}/{} cells differ\n",
        result.label(),
        result.tables_compared.len(),
        overall.tables_with_differences,
        overall.cells.cells_differing,
        overall.cells.cells_compared,
    );

    if !result.tables_missing_right.is_empty() {
        out.push_str(&format!(
            "  only in {}: {}\n",
            result.run_ids.left,
            result.tables_missing_right.join(", ")
        ));
    }
    if !result.tables_missing_left.is_empty() {
        out.push_str(&format!(
            "  only in {}: {}\n",
            result.run_ids.right,
            result.tables_missing_left.join(", ")
        ));
    }

    if !result.summary_rows.is_empty() {
        let width = result
            .summary_rows
            .iter()
            .map(|r| r.table_name.len())
            .max()
            .unwrap_or(0)
            .max("TABLE".len());

        out.push('\n');
        out.push_str(&format!(
            "  {:<width$}  {:<19}  {:>8}  {:>8}  {:>7}\n",
            "TABLE", "STATUS", "CELLS", "DIFFER", "DIFF %"
        ));
        for row in &result.summary_rows {
            out.push_str(&format!(
                "  {:<width$}  {:<19}  {:>8}  {:>8}  {:>7.2}",
                row.table_name,
                row.status.as_str(),
                row.cells_compared,
                row.cells_differing,
                row.difference_percent,
            ));
            if let Some(note) = row_note(result, &row.table_name, row.error.as_deref()) {
                out.push_str("  ");
                out.push_str(&note);
            }
            out.push('\n');
        }
    }

    let top = &result.summary_stats.top_deviations;
    if !top.is_empty() {
        out.push_str("\n  top deviations:\n");
        for d in top {
            out.push_str(&format!(
                "    {} {} {}: {} -> {} (abs {}, rel {})\n",
                d.table_name,
                d.row_key,
                d.measure_name,
                format_value(&d.left_value),
                format_value(&d.right_value),
                format_diff(d.absolute_diff),
                format_diff(d.relative_diff),
            ));
        }
    }

    out
}

fn row_note(result: &ComparisonResult, table: &str, error: Option<&str>) -> Option<String> {
    if let Some(e) = error {
        return Some(e.to_string());
    }
    let diff = result.table_diffs.get(table)?;
    let rows = diff.row_alignment;
    if diff.table_status == TableStatus::Differs && (rows.left_only > 0 || rows.right_only > 0) {
        Some(format!("rows: {} left only, {} right only", rows.left_only, rows.right_only))
    } else {
        None
    }
}

fn format_value(value: &MeasureValue) -> String {
    match value {
        MeasureValue::Null => "null".to_string(),
        MeasureValue::Number(n) => n.to_string(),
        MeasureValue::Text(s) => format!("{s:?}"),
    }
}

fn format_diff(diff: Option<f64>) -> String {
    match diff {
        Some(d) if d != 0.0 && !(1e-3..1e6).contains(&d.abs()) => format!("{d:.3e}"),
        Some(d) => format!("{d:.6}"),
        None => "n/a".to_string(),
    }
}
