// Cell classification for aligned tables.
// Pure functions: aligned rows in, per-table diff record out.

use crate::config::Tolerance;
use crate::model::{CellComparison, CellStatus, RowAlignment, SchemaDiff, TableDiff, TableStatus};
use crate::reconcile::AlignedTable;
use crate::table::MeasureValue;

/// Status and magnitudes for one pair of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellOutcome {
    pub status: CellStatus,
    pub absolute_diff: Option<f64>,
    pub relative_diff: Option<f64>,
    pub delta: Option<f64>,
}

impl CellOutcome {
    fn status_only(status: CellStatus) -> Self {
        Self {
            status,
            absolute_diff: None,
            relative_diff: None,
            delta: None,
        }
    }
}

/// Classify one cell.
///
/// Nulls are checked first, then text (identical labels are `EQUAL`), then
/// non-finite sentinels. Finite values are `EQUAL` when within the absolute
/// OR the relative tolerance.
pub fn classify_cell(left: &MeasureValue, right: &MeasureValue, tolerance: Tolerance) -> CellOutcome {
    match (left, right) {
        (MeasureValue::Null, MeasureValue::Null) => CellOutcome::status_only(CellStatus::Equal),
        (MeasureValue::Null, _) => CellOutcome::status_only(CellStatus::MissingLeft),
        (_, MeasureValue::Null) => CellOutcome::status_only(CellStatus::MissingRight),
        (MeasureValue::Text(l), MeasureValue::Text(r)) if l == r => CellOutcome::status_only(CellStatus::Equal),
        (MeasureValue::Text(_), _) | (_, MeasureValue::Text(_)) => {
            CellOutcome::status_only(CellStatus::NotComparable)
        }
        (MeasureValue::Number(l), MeasureValue::Number(r)) => classify_numbers(*l, *r, tolerance),
    }
}

fn classify_numbers(left: f64, right: f64, tolerance: Tolerance) -> CellOutcome {
    if !left.is_finite() || !right.is_finite() {
        // NaN/NaN and same-signed infinities are the same sentinel.
        let same = (left.is_nan() && right.is_nan()) || left == right;
        let status = if same { CellStatus::Equal } else { CellStatus::Differs };
        return CellOutcome::status_only(status);
    }

    let absolute_diff = (left - right).abs();
    let scale = left.abs().max(right.abs());
    let relative_diff = if scale > 0.0 {
        Some(absolute_diff / scale)
    } else {
        None
    };

    let within = absolute_diff <= tolerance.absolute
        || relative_diff.is_some_and(|rel| rel <= tolerance.relative);

    CellOutcome {
        status: if within { CellStatus::Equal } else { CellStatus::Differs },
        absolute_diff: Some(absolute_diff),
        relative_diff,
        delta: Some(right - left),
    }
}

/// Compare every measure of every row present on both sides.
///
/// Cells are ordered by the left table's row order, then its measure order.
pub fn diff_table(aligned: &AlignedTable<'_>, tolerance: Tolerance) -> TableDiff {
    let table_name = aligned.left.name();
    let measures = aligned.left.measures();

    let mut cell_results = Vec::with_capacity(aligned.row_pairs.len() * measures.len());

    for (left_row, right_row) in &aligned.row_pairs {
        for (li, &ri) in aligned.measure_map.iter().enumerate() {
            let left_value = &left_row.measures[li];
            let right_value = &right_row.measures[ri];
            let outcome = classify_cell(left_value, right_value, tolerance);

            cell_results.push(CellComparison {
                table_name: table_name.to_string(),
                row_key: left_row.key.clone(),
                measure_name: measures[li].clone(),
                status: outcome.status,
                left_value: left_value.clone(),
                right_value: right_value.clone(),
                absolute_diff: outcome.absolute_diff,
                relative_diff: outcome.relative_diff,
                delta: outcome.delta,
            });
        }
    }

    let all_equal = cell_results.iter().all(|c| c.status == CellStatus::Equal);
    let rows = aligned.row_alignment;
    let table_status = if all_equal && rows.left_only == 0 && rows.right_only == 0 {
        TableStatus::Identical
    } else {
        TableStatus::Differs
    };

    log::debug!(
        "table '{table_name}': {} rows both, {} left only, {} right only, {} cells, {table_status}",
        rows.both,
        rows.left_only,
        rows.right_only,
        cell_results.len(),
    );

    TableDiff {
        table_name: table_name.to_string(),
        table_status,
        row_alignment: rows,
        schema_diff: SchemaDiff::default(),
        cell_results,
    }
}

/// Record for a table whose schemas disagree. Carries counts only.
pub fn structural_mismatch(table_name: &str, schema_diff: SchemaDiff, row_alignment: RowAlignment) -> TableDiff {
    log::debug!("table '{table_name}': structural mismatch ({})", schema_diff.describe());
    TableDiff {
        table_name: table_name.to_string(),
        table_status: TableStatus::StructuralMismatch,
        row_alignment,
        schema_diff,
        cell_results: Vec::new(),
    }
}
