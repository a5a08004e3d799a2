use std::borrow::Cow;

use crate::bundle::RunBundle;
use crate::error::CompareError;
use crate::model::{RowAlignment, SchemaDiff};
use crate::table::{Row, RowKey, TableModel};

// ---------------------------------------------------------------------------
// Bundle level
// ---------------------------------------------------------------------------

/// Tables shared by both bundles plus the names present on one side only.
#[derive(Debug)]
pub struct BundleAlignment<'a> {
    /// Shared tables in name order.
    pub shared: Vec<(&'a TableModel, &'a TableModel)>,
    /// Present on the right only.
    pub missing_left: Vec<String>,
    /// Present on the left only.
    pub missing_right: Vec<String>,
}

/// Split the union of table names into shared / left-only / right-only.
pub fn align_bundles<'a>(left: &'a RunBundle, right: &'a RunBundle) -> BundleAlignment<'a> {
    let mut names = left.table_names();
    names.extend(right.table_names());

    let mut shared = Vec::new();
    let mut missing_left = Vec::new();
    let mut missing_right = Vec::new();

    for name in names {
        match (left.get_table(name), right.get_table(name)) {
            (Ok(l), Ok(r)) => shared.push((l, r)),
            (Ok(_), Err(CompareError::TableNotFound { .. })) => {
                log::debug!("table '{name}' missing from run '{}'", right.run_id());
                missing_right.push(name.to_string());
            }
            (Err(CompareError::TableNotFound { .. }), Ok(_)) => {
                log::debug!("table '{name}' missing from run '{}'", left.run_id());
                missing_left.push(name.to_string());
            }
            // The name came from one of the two bundles.
            _ => {}
        }
    }

    BundleAlignment {
        shared,
        missing_left,
        missing_right,
    }
}

// ---------------------------------------------------------------------------
// Table level
// ---------------------------------------------------------------------------

/// Two structurally compatible tables with their rows matched by key.
#[derive(Debug)]
pub struct AlignedTable<'a> {
    pub left: &'a TableModel,
    pub right: &'a TableModel,
    pub row_alignment: RowAlignment,
    /// Rows present on both sides, in the left table's extraction order.
    pub row_pairs: Vec<(&'a Row, &'a Row)>,
    /// For each left measure (declared order), its position in the right table.
    pub measure_map: Vec<usize>,
}

#[derive(Debug)]
pub enum TableAlignment<'a> {
    /// Dimension or measure sets differ; no cell comparison is possible.
    StructuralMismatch {
        schema_diff: SchemaDiff,
        row_alignment: RowAlignment,
    },
    Aligned(AlignedTable<'a>),
}

/// Structural pre-check, then row alignment through the key index.
///
/// Dimension and measure order are normalized; only set differences count
/// as a mismatch.
pub fn align_table<'a>(left: &'a TableModel, right: &'a TableModel) -> TableAlignment<'a> {
    let schema_diff = schema_diff(left, right);

    // left position of each right dimension: right key = left key permuted
    let to_right: Option<Vec<usize>> = right
        .dimensions()
        .iter()
        .map(|d| left.dimension_position(d))
        .collect();
    let to_left: Option<Vec<usize>> = left
        .dimensions()
        .iter()
        .map(|d| right.dimension_position(d))
        .collect();

    let (to_right, to_left) = match (to_right, to_left) {
        (Some(r), Some(l)) if !schema_diff.dimensions_differ() => (r, l),
        _ => {
            return TableAlignment::StructuralMismatch {
                schema_diff,
                row_alignment: RowAlignment {
                    both: 0,
                    left_only: left.len(),
                    right_only: right.len(),
                },
            };
        }
    };

    let same_order = left.dimensions() == right.dimensions();
    let project = |key: &'a RowKey, perm: &[usize]| -> Cow<'a, RowKey> {
        if same_order {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(key.permuted(perm))
        }
    };

    let mut row_pairs = Vec::new();
    let mut left_only = 0;
    for row in left.rows() {
        match right.get(&project(&row.key, &to_right)) {
            Some(other) => row_pairs.push((row, other)),
            None => left_only += 1,
        }
    }

    let right_only = right
        .rows()
        .iter()
        .filter(|row| !left.contains_key(&project(&row.key, &to_left)))
        .count();

    let row_alignment = RowAlignment {
        both: row_pairs.len(),
        left_only,
        right_only,
    };

    if !schema_diff.is_empty() {
        return TableAlignment::StructuralMismatch {
            schema_diff,
            row_alignment,
        };
    }

    let measure_map: Option<Vec<usize>> = left
        .measures()
        .iter()
        .map(|m| right.measure_position(m))
        .collect();

    match measure_map {
        Some(measure_map) => TableAlignment::Aligned(AlignedTable {
            left,
            right,
            row_alignment,
            row_pairs,
            measure_map,
        }),
        None => TableAlignment::StructuralMismatch {
            schema_diff,
            row_alignment,
        },
    }
}

fn schema_diff(left: &TableModel, right: &TableModel) -> SchemaDiff {
    let only = |a: &[String], b: &[String]| -> Vec<String> {
        a.iter().filter(|c| !b.contains(c)).cloned().collect()
    };
    SchemaDiff {
        dimensions_left_only: only(left.dimensions(), right.dimensions()),
        dimensions_right_only: only(right.dimensions(), left.dimensions()),
        measures_left_only: only(left.measures(), right.measures()),
        measures_right_only: only(right.measures(), left.measures()),
    }
}
