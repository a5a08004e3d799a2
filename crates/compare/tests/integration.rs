// End-to-end tests over the on-disk fixtures: load, align, diff, summarize.
//
// fixtures/baseline   ompp-1.15.3, manifest + CSV
// fixtures/candidate  ompp-1.15.4, manifest + CSV (one value drift, reordered
//                     IncomeTable, RegionTable gains a dimension, NewTable)
// fixtures/rerun.json ompp-1.15.3 rerun as an inline JSON bundle

use std::path::PathBuf;

use runcmp_compare::model::RowAlignment;
use runcmp_compare::*;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn baseline() -> RunBundle {
    load_bundle(&fixture("baseline/bundle.toml")).unwrap()
}

fn candidate() -> RunBundle {
    load_bundle(&fixture("candidate/bundle.toml")).unwrap()
}

fn rerun() -> RunBundle {
    load_bundle(&fixture("rerun.json")).unwrap()
}

// ===========================================================================
// Loading
// ===========================================================================

#[test]
fn manifest_bundle_loads_every_table() {
    let bundle = baseline();
    assert_eq!(bundle.run_id(), "ompp-1.15.3");
    assert_eq!(bundle.len(), 4);
    let age = bundle.get_table("AgeTable").unwrap();
    assert_eq!(age.measures(), &["expr_value".to_string()]);
    assert_eq!(age.len(), 4);
    assert_eq!(bundle.row_count(), 4 + 3 + 2 + 2);
}

#[test]
fn unknown_table_lookup_fails() {
    let err = baseline().get_table("NoSuchTable").unwrap_err();
    assert!(matches!(err, CompareError::TableNotFound { .. }));
    assert_eq!(err.to_string(), "run 'ompp-1.15.3': table 'NoSuchTable' not found");
}

#[test]
fn missing_csv_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("bundle.toml");
    std::fs::write(
        &manifest,
        "run_id = \"r\"\n\n[[tables]]\nname = \"T\"\nfile = \"absent.csv\"\ndimensions = [\"d\"]\n",
    )
    .unwrap();
    let err = load_bundle(&manifest).unwrap_err();
    assert!(matches!(err, CompareError::Io(_)), "got {err}");
}

#[test]
fn manifest_with_unknown_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("bundle.toml");
    std::fs::write(&manifest, "run_id = \"r\"\nrun_name = \"typo\"\n").unwrap();
    let err = load_bundle(&manifest).unwrap_err();
    assert!(matches!(err, CompareError::BundleParse { .. }), "got {err}");
}

#[test]
fn duplicate_row_key_in_csv_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("T.csv"), "d,v\n1,1.0\n1,2.0\n").unwrap();
    let manifest = dir.path().join("bundle.toml");
    std::fs::write(
        &manifest,
        "run_id = \"r\"\n\n[[tables]]\nname = \"T\"\nfile = \"T.csv\"\ndimensions = [\"d\"]\n",
    )
    .unwrap();
    let err = load_bundle(&manifest).unwrap_err();
    assert!(matches!(err, CompareError::MalformedTable { ref table, .. } if table == "T"), "got {err}");
}

// ===========================================================================
// Pairwise comparison
// ===========================================================================

#[test]
fn baseline_vs_candidate() {
    let result = compare(&baseline(), &candidate(), &CompareConfig::default()).unwrap();

    assert_eq!(result.run_ids.left, "ompp-1.15.3");
    assert_eq!(result.run_ids.right, "ompp-1.15.4");
    assert_eq!(result.tables_compared, vec!["AgeTable", "IncomeTable", "RegionTable"]);
    assert_eq!(result.tables_missing_left, vec!["NewTable"]);
    assert_eq!(result.tables_missing_right, vec!["RetiredTable"]);
    assert!(result.has_differences());

    // one drift beyond tolerance, one within relative tolerance, one null pair
    let age = &result.table_diffs["AgeTable"];
    assert_eq!(age.table_status, TableStatus::Differs);
    let statuses: Vec<CellStatus> = age.cell_results.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![CellStatus::Equal, CellStatus::Differs, CellStatus::Equal, CellStatus::Equal]
    );
    assert_eq!(age.cell_results[1].absolute_diff, Some(0.5));
    assert_eq!(age.cell_results[1].delta, Some(0.5));

    // reordered columns align; row set differs
    let income = &result.table_diffs["IncomeTable"];
    assert_eq!(income.table_status, TableStatus::Differs);
    assert_eq!(
        income.row_alignment,
        RowAlignment {
            both: 2,
            left_only: 1,
            right_only: 1
        }
    );
    assert_eq!(income.cell_results.len(), 4);
    assert!(income.cell_results.iter().all(|c| c.status == CellStatus::Equal));
    assert_eq!(income.cell_results[0].measure_name, "expr0");

    let region = &result.table_diffs["RegionTable"];
    assert_eq!(region.table_status, TableStatus::StructuralMismatch);
    assert_eq!(region.schema_diff.dimensions_right_only, vec!["sex"]);
    assert!(region.cell_results.is_empty());
}

#[test]
fn baseline_vs_candidate_summary() {
    let result = compare(&baseline(), &candidate(), &CompareConfig::default()).unwrap();
    let stats = &result.summary_stats;

    assert_eq!(stats.overall.tables_with_differences, 3);
    assert_eq!(stats.overall.cells.cells_compared, 8);
    assert_eq!(stats.overall.cells.cells_differing, 1);

    // IncomeTable differs only in its row set, so it has no per-table cell stats
    assert_eq!(stats.per_table.keys().collect::<Vec<_>>(), vec!["AgeTable"]);
    let age = &stats.per_table["AgeTable"];
    assert_eq!(age.cells.difference_percent, 25.0);
    assert_eq!(age.per_measure["expr_value"].diff_count, 1);

    assert_eq!(stats.top_deviations.len(), 1);
    let top = &stats.top_deviations[0];
    assert_eq!(top.table_name, "AgeTable");
    assert_eq!(top.row_key, RowKey(vec![DimValue::Int(1)]));
    assert_eq!(top.measure_name, "expr_value");

    let rows = &result.summary_rows;
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.comparison == "ompp-1.15.3 vs ompp-1.15.4"));
    assert_eq!(
        rows[2].error.as_deref(),
        Some("structural mismatch: dimensions right only [sex]")
    );
}

#[test]
fn json_rerun_matches_csv_baseline() {
    let result = compare(&baseline(), &rerun(), &CompareConfig::default()).unwrap();
    assert!(!result.has_differences());
    assert_eq!(result.tables_compared.len(), 4);
    assert!(result.summary_stats.per_table.is_empty());
    assert_eq!(result.summary_stats.overall.cells.cells_compared, 4 + 6 + 2 + 2);
}

#[test]
fn looser_tolerance_from_config_file() {
    let text = std::fs::read_to_string(fixture("loose.toml")).unwrap();
    let config = CompareConfig::from_toml(&text).unwrap();
    let result = compare(&baseline(), &candidate(), &config).unwrap();

    assert_eq!(result.table_diffs["AgeTable"].table_status, TableStatus::Identical);
    assert!(result.summary_stats.top_deviations.is_empty());
    assert_eq!(result.meta.absolute_tolerance, 1.0);
    assert_eq!(result.meta.top_n, 5);
}

#[test]
fn output_is_byte_identical_across_runs() {
    let config = CompareConfig::default();
    let first = serde_json::to_string(&compare(&baseline(), &candidate(), &config).unwrap()).unwrap();
    let second = serde_json::to_string(&compare(&baseline(), &candidate(), &config).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn reversed_direction_mirrors_missing_sides() {
    let forward = compare(&baseline(), &candidate(), &CompareConfig::default()).unwrap();
    let backward = compare(&candidate(), &baseline(), &CompareConfig::default()).unwrap();
    assert_eq!(forward.tables_missing_left, backward.tables_missing_right);
    assert_eq!(forward.tables_missing_right, backward.tables_missing_left);

    let f = &forward.table_diffs["AgeTable"].cell_results[1];
    let b = &backward.table_diffs["AgeTable"].cell_results[1];
    assert_eq!(f.status, b.status);
    assert_eq!(f.delta.map(|d| -d), b.delta);
}

// ===========================================================================
// Suite
// ===========================================================================

#[test]
fn suite_against_first_bundle() {
    let bundles = vec![baseline(), candidate(), rerun()];
    let suite = compare_suite(&bundles, &CompareConfig::default()).unwrap();

    assert_eq!(suite.baseline_run_id, "ompp-1.15.3");
    assert_eq!(suite.comparisons.len(), 2);
    assert_eq!(suite.overall.pairs_compared, 2);
    assert_eq!(suite.overall.pairs_with_differences, 1);
    assert!(suite.get("ompp-1.15.4").unwrap().has_differences());
    assert!(!suite.get("ompp-1.15.3-rerun").unwrap().has_differences());
}

#[test]
fn suite_with_candidate_as_baseline() {
    let bundles = vec![baseline(), candidate(), rerun()];
    let config = CompareConfig {
        baseline_run_id: Some("ompp-1.15.4".into()),
        ..CompareConfig::default()
    };
    let suite = compare_suite(&bundles, &config).unwrap();
    assert_eq!(suite.baseline_run_id, "ompp-1.15.4");
    let rights: Vec<&str> = suite.comparisons.iter().map(|c| c.run_ids.right.as_str()).collect();
    assert_eq!(rights, vec!["ompp-1.15.3", "ompp-1.15.3-rerun"]);
    assert_eq!(suite.overall.pairs_with_differences, 2);
}
