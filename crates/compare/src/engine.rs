use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;

use crate::aggregate::{summarize, summary_rows};
use crate::bundle::RunBundle;
use crate::config::CompareConfig;
use crate::differ::{diff_table, structural_mismatch};
use crate::error::{CompareError, Result};
use crate::model::{ComparisonMeta, ComparisonResult, RunIds, SuiteOverview, SuiteResult};
use crate::reconcile::{align_bundles, align_table, TableAlignment};

/// Compare two bundles. `left` is the reference side.
pub fn compare(left: &RunBundle, right: &RunBundle, config: &CompareConfig) -> Result<ComparisonResult> {
    config.validate()?;
    Ok(compare_validated(left, right, config))
}

/// Compare a baseline bundle against every other bundle.
///
/// The baseline is `config.baseline_run_id`, or the first bundle when unset.
/// Returns one result per non-baseline bundle, in input order.
pub fn compare_suite(bundles: &[RunBundle], config: &CompareConfig) -> Result<SuiteResult> {
    config.validate()?;

    if bundles.len() < 2 {
        return Err(CompareError::Configuration(format!(
            "at least 2 run bundles are required, got {}",
            bundles.len()
        )));
    }

    let mut seen = HashSet::new();
    for bundle in bundles {
        if !seen.insert(bundle.run_id()) {
            return Err(CompareError::Configuration(format!(
                "run id '{}' supplied more than once",
                bundle.run_id()
            )));
        }
    }

    let baseline_idx = match config.baseline_run_id {
        Some(ref id) => bundles
            .iter()
            .position(|b| b.run_id() == id.as_str())
            .ok_or_else(|| CompareError::Configuration(format!("baseline run '{id}' not among the supplied bundles")))?,
        None => 0,
    };
    let baseline = &bundles[baseline_idx];

    let candidates: Vec<&RunBundle> = bundles
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != baseline_idx)
        .map(|(_, b)| b)
        .collect();

    let comparisons: Vec<ComparisonResult> = candidates
        .par_iter()
        .map(|candidate| compare_validated(baseline, candidate, config))
        .collect();

    let overall = SuiteOverview {
        pairs_compared: comparisons.len(),
        pairs_with_differences: comparisons.iter().filter(|c| c.has_differences()).count(),
        tables_with_differences: comparisons
            .iter()
            .map(|c| c.summary_stats.overall.tables_with_differences)
            .sum(),
        cells_differing: comparisons
            .iter()
            .map(|c| c.summary_stats.overall.cells.cells_differing)
            .sum(),
    };

    Ok(SuiteResult {
        baseline_run_id: baseline.run_id().to_string(),
        comparisons,
        overall,
    })
}

fn compare_validated(left: &RunBundle, right: &RunBundle, config: &CompareConfig) -> ComparisonResult {
    let alignment = align_bundles(left, right);
    let tolerance = config.tolerance();

    let mut tables_compared = Vec::with_capacity(alignment.shared.len());
    let mut table_diffs = BTreeMap::new();

    for (l, r) in alignment.shared {
        let diff = match align_table(l, r) {
            TableAlignment::Aligned(aligned) => diff_table(&aligned, tolerance),
            TableAlignment::StructuralMismatch {
                schema_diff,
                row_alignment,
            } => structural_mismatch(l.name(), schema_diff, row_alignment),
        };
        tables_compared.push(l.name().to_string());
        table_diffs.insert(l.name().to_string(), diff);
    }

    let run_ids = RunIds {
        left: left.run_id().to_string(),
        right: right.run_id().to_string(),
    };
    let label = format!("{} vs {}", run_ids.left, run_ids.right);

    let summary_stats = summarize(&table_diffs, config.top_n);
    let summary_rows = summary_rows(&label, &table_diffs);

    log::info!(
        "{label}: {} tables compared, {} with differences, {} differing cells, {} missing left, {} missing right",
        tables_compared.len(),
        summary_stats.overall.tables_with_differences,
        summary_stats.overall.cells.cells_differing,
        alignment.missing_left.len(),
        alignment.missing_right.len(),
    );

    ComparisonResult {
        meta: ComparisonMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            absolute_tolerance: config.absolute_tolerance,
            relative_tolerance: config.relative_tolerance,
            top_n: config.top_n,
        },
        run_ids,
        tables_compared,
        tables_missing_left: alignment.missing_left,
        tables_missing_right: alignment.missing_right,
        table_diffs,
        summary_stats,
        summary_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellStatus, TableStatus};
    use crate::table::{Record, TableModel, Value};

    fn table(name: &str, values: &[(i64, f64)]) -> TableModel {
        let records: Vec<Record> = values
            .iter()
            .map(|(k, v)| {
                [("dim0".to_string(), Value::Integer(*k)), ("expr_value".to_string(), Value::Float(*v))]
                    .into_iter()
                    .collect()
            })
            .collect();
        TableModel::new(name, vec!["dim0".into()], vec!["expr_value".into()], records).unwrap()
    }

    fn bundle(run_id: &str, tables: Vec<TableModel>) -> RunBundle {
        RunBundle::new(run_id, tables).unwrap()
    }

    #[test]
    fn self_comparison_is_identical() {
        let b = bundle("v1", vec![table("T1", &[(0, 1.0), (1, 2.5)]), table("T2", &[(0, 0.0)])]);
        let result = compare(&b, &b, &CompareConfig::default()).unwrap();
        assert!(!result.has_differences());
        for diff in result.table_diffs.values() {
            assert_eq!(diff.table_status, TableStatus::Identical);
            assert!(diff.cell_results.iter().all(|c| c.status == CellStatus::Equal));
        }
        assert!(result.summary_stats.per_table.is_empty());
        assert!(result.summary_stats.top_deviations.is_empty());
    }

    #[test]
    fn missing_tables_excluded_from_diffs() {
        let left = bundle("v1", vec![table("T1", &[(0, 1.0)]), table("OnlyLeft", &[(0, 1.0)])]);
        let right = bundle("v2", vec![table("T1", &[(0, 1.0)]), table("OnlyRight", &[(0, 1.0)])]);
        let result = compare(&left, &right, &CompareConfig::default()).unwrap();
        assert_eq!(result.tables_compared, vec!["T1"]);
        assert_eq!(result.tables_missing_right, vec!["OnlyLeft"]);
        assert_eq!(result.tables_missing_left, vec!["OnlyRight"]);
        assert!(!result.table_diffs.contains_key("OnlyLeft"));
        assert!(result.has_differences());
    }

    #[test]
    fn invalid_config_fails_fast() {
        let b = bundle("v1", vec![]);
        let config = CompareConfig {
            relative_tolerance: -1.0,
            ..CompareConfig::default()
        };
        assert!(matches!(compare(&b, &b, &config), Err(CompareError::Configuration(_))));
    }

    #[test]
    fn suite_uses_named_baseline() {
        let bundles = vec![
            bundle("v1", vec![table("T", &[(0, 1.0)])]),
            bundle("v2", vec![table("T", &[(0, 2.0)])]),
            bundle("v3", vec![table("T", &[(0, 1.0)])]),
        ];
        let config = CompareConfig {
            baseline_run_id: Some("v2".into()),
            ..CompareConfig::default()
        };
        let suite = compare_suite(&bundles, &config).unwrap();
        assert_eq!(suite.baseline_run_id, "v2");
        assert_eq!(suite.comparisons.len(), 2);
        assert_eq!(suite.comparisons[0].run_ids.right, "v1");
        assert_eq!(suite.comparisons[1].run_ids.right, "v3");
        assert_eq!(suite.overall.pairs_with_differences, 2);
        assert_eq!(suite.overall.cells_differing, 2);
        assert!(suite.get("v3").is_some());
    }

    #[test]
    fn suite_defaults_to_first_bundle() {
        let bundles = vec![
            bundle("v1", vec![table("T", &[(0, 1.0)])]),
            bundle("v2", vec![table("T", &[(0, 1.0)])]),
        ];
        let suite = compare_suite(&bundles, &CompareConfig::default()).unwrap();
        assert_eq!(suite.baseline_run_id, "v1");
        assert_eq!(suite.comparisons.len(), 1);
        assert!(!suite.has_differences());
    }

    #[test]
    fn suite_rejects_bad_input() {
        let one = vec![bundle("v1", vec![])];
        assert!(matches!(
            compare_suite(&one, &CompareConfig::default()),
            Err(CompareError::Configuration(_))
        ));

        let dup = vec![bundle("v1", vec![]), bundle("v1", vec![])];
        assert!(matches!(
            compare_suite(&dup, &CompareConfig::default()),
            Err(CompareError::Configuration(_))
        ));

        let two = vec![bundle("v1", vec![]), bundle("v2", vec![])];
        let config = CompareConfig {
            baseline_run_id: Some("v9".into()),
            ..CompareConfig::default()
        };
        let err = compare_suite(&two, &config).unwrap_err();
        assert!(err.to_string().contains("baseline run 'v9'"));
    }
}
