use std::collections::BTreeMap;

use serde::Serialize;

use crate::table::{MeasureValue, RowKey};

// ---------------------------------------------------------------------------
// Cell classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellStatus {
    Equal,
    Differs,
    MissingLeft,
    MissingRight,
    NotComparable,
}

impl CellStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellStatus::Equal => "EQUAL",
            CellStatus::Differs => "DIFFERS",
            CellStatus::MissingLeft => "MISSING_LEFT",
            CellStatus::MissingRight => "MISSING_RIGHT",
            CellStatus::NotComparable => "NOT_COMPARABLE",
        }
    }
}

impl std::fmt::Display for CellStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing one measure in one row present on both sides.
#[derive(Debug, Clone, Serialize)]
pub struct CellComparison {
    pub table_name: String,
    pub row_key: RowKey,
    pub measure_name: String,
    pub status: CellStatus,
    pub left_value: MeasureValue,
    pub right_value: MeasureValue,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub absolute_diff: Option<f64>,
    /// `None` when both sides are zero, or either is absent or non-finite.
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub relative_diff: Option<f64>,
    /// Signed `right - left`.
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub delta: Option<f64>,
}

// ---------------------------------------------------------------------------
// Per-table record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Identical,
    Differs,
    StructuralMismatch,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Identical => "IDENTICAL",
            TableStatus::Differs => "DIFFERS",
            TableStatus::StructuralMismatch => "STRUCTURAL_MISMATCH",
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowAlignment {
    pub both: usize,
    pub left_only: usize,
    pub right_only: usize,
}

/// Columns declared on one side only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDiff {
    pub dimensions_left_only: Vec<String>,
    pub dimensions_right_only: Vec<String>,
    pub measures_left_only: Vec<String>,
    pub measures_right_only: Vec<String>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.dimensions_left_only.is_empty()
            && self.dimensions_right_only.is_empty()
            && self.measures_left_only.is_empty()
            && self.measures_right_only.is_empty()
    }

    pub fn dimensions_differ(&self) -> bool {
        !self.dimensions_left_only.is_empty() || !self.dimensions_right_only.is_empty()
    }

    /// One-line description, e.g. `dimensions left only [sex]`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        let mut side = |label: &str, cols: &[String]| {
            if !cols.is_empty() {
                parts.push(format!("{label} [{}]", cols.join(", ")));
            }
        };
        side("dimensions left only", &self.dimensions_left_only);
        side("dimensions right only", &self.dimensions_right_only);
        side("measures left only", &self.measures_left_only);
        side("measures right only", &self.measures_right_only);
        parts.join("; ")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableDiff {
    pub table_name: String,
    pub table_status: TableStatus,
    pub row_alignment: RowAlignment,
    #[serde(skip_serializing_if = "SchemaDiff::is_empty")]
    pub schema_diff: SchemaDiff,
    pub cell_results: Vec<CellComparison>,
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Counts and magnitudes shared by the per-table and overall summaries.
/// Magnitudes cover `DIFFERS` cells only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellStats {
    pub cells_compared: usize,
    pub cells_differing: usize,
    pub missing_left: usize,
    pub missing_right: usize,
    pub not_comparable: usize,
    pub difference_percent: f64,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub max_absolute_diff: Option<f64>,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub mean_absolute_diff: Option<f64>,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub max_relative_diff: Option<f64>,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub mean_relative_diff: Option<f64>,
}

/// Signed-delta spread for one measure column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureStats {
    pub diff_count: usize,
    pub diff_percent: f64,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub min_delta: Option<f64>,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub max_delta: Option<f64>,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub median_delta: Option<f64>,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub mean_delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStats {
    #[serde(flatten)]
    pub cells: CellStats,
    pub per_measure: BTreeMap<String, MeasureStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverallStats {
    pub tables_with_differences: usize,
    #[serde(flatten)]
    pub cells: CellStats,
}

/// One entry of the top-N triage list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deviation {
    pub table_name: String,
    pub row_key: RowKey,
    pub measure_name: String,
    pub left_value: MeasureValue,
    pub right_value: MeasureValue,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub absolute_diff: Option<f64>,
    #[serde(serialize_with = "crate::float::serialize_option")]
    pub relative_diff: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryStats {
    /// Tables with at least one non-`EQUAL` cell.
    pub per_table: BTreeMap<String, TableStats>,
    pub overall: OverallStats,
    pub top_deviations: Vec<Deviation>,
}

/// Flat per-table line for the report's overview table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub table_name: String,
    pub comparison: String,
    pub status: TableStatus,
    pub cells_compared: usize,
    pub cells_differing: usize,
    pub difference_percent: f64,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Comparison result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunIds {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonMeta {
    pub engine_version: String,
    pub absolute_tolerance: f64,
    pub relative_tolerance: f64,
    pub top_n: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub meta: ComparisonMeta,
    pub run_ids: RunIds,
    pub tables_compared: Vec<String>,
    /// Present on the right only.
    pub tables_missing_left: Vec<String>,
    /// Present on the left only.
    pub tables_missing_right: Vec<String>,
    pub table_diffs: BTreeMap<String, TableDiff>,
    pub summary_stats: SummaryStats,
    pub summary_rows: Vec<SummaryRow>,
}

impl ComparisonResult {
    /// Any missing table or any table not `IDENTICAL`.
    pub fn has_differences(&self) -> bool {
        !self.tables_missing_left.is_empty()
            || !self.tables_missing_right.is_empty()
            || self
                .table_diffs
                .values()
                .any(|d| d.table_status != TableStatus::Identical)
    }

    pub fn label(&self) -> String {
        format!("{} vs {}", self.run_ids.left, self.run_ids.right)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuiteOverview {
    pub pairs_compared: usize,
    pub pairs_with_differences: usize,
    pub tables_with_differences: usize,
    pub cells_differing: usize,
}

/// Baseline compared against every other run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteResult {
    pub baseline_run_id: String,
    pub comparisons: Vec<ComparisonResult>,
    pub overall: SuiteOverview,
}

impl SuiteResult {
    pub fn has_differences(&self) -> bool {
        self.comparisons.iter().any(ComparisonResult::has_differences)
    }

    pub fn get(&self, run_id: &str) -> Option<&ComparisonResult> {
        self.comparisons.iter().find(|c| c.run_ids.right == run_id)
    }
}
