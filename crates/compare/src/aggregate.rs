use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::{
    CellComparison, CellStats, CellStatus, Deviation, MeasureStats, OverallStats, SummaryRow,
    SummaryStats, TableDiff, TableStats, TableStatus,
};

/// Roll per-table diff records into per-table, overall and top-N statistics.
pub fn summarize(table_diffs: &BTreeMap<String, TableDiff>, top_n: usize) -> SummaryStats {
    let mut per_table = BTreeMap::new();
    let mut overall = CellAccumulator::default();

    for (name, diff) in table_diffs {
        let mut table = CellAccumulator::default();
        let mut measures: BTreeMap<&str, MeasureAccumulator> = BTreeMap::new();

        for cell in &diff.cell_results {
            table.add(cell);
            overall.add(cell);
            measures.entry(cell.measure_name.as_str()).or_default().add(cell);
        }

        if table.non_equal() > 0 {
            let per_measure = measures
                .into_iter()
                .filter(|(_, m)| m.diff_count > 0)
                .map(|(measure, m)| (measure.to_string(), m.finish()))
                .collect();
            per_table.insert(
                name.clone(),
                TableStats {
                    cells: table.finish(),
                    per_measure,
                },
            );
        }
    }

    let tables_with_differences = table_diffs
        .values()
        .filter(|d| d.table_status != TableStatus::Identical)
        .count();

    let differing = table_diffs
        .values()
        .flat_map(|d| d.cell_results.iter())
        .filter(|c| c.status == CellStatus::Differs);

    SummaryStats {
        per_table,
        overall: OverallStats {
            tables_with_differences,
            cells: overall.finish(),
        },
        top_deviations: top_deviations(differing, top_n),
    }
}

/// The `top_n` largest deviations: relative diff descending, then absolute
/// diff descending, then table name, row key and measure name ascending.
/// Cells with no defined diff rank after every cell that has one.
pub fn top_deviations<'a>(cells: impl Iterator<Item = &'a CellComparison>, top_n: usize) -> Vec<Deviation> {
    let mut ranked: Vec<&CellComparison> = cells.collect();
    ranked.sort_by(|a, b| deviation_order(a, b));
    ranked.truncate(top_n);
    ranked
        .into_iter()
        .map(|c| Deviation {
            table_name: c.table_name.clone(),
            row_key: c.row_key.clone(),
            measure_name: c.measure_name.clone(),
            left_value: c.left_value.clone(),
            right_value: c.right_value.clone(),
            absolute_diff: c.absolute_diff,
            relative_diff: c.relative_diff,
        })
        .collect()
}

fn deviation_order(a: &CellComparison, b: &CellComparison) -> Ordering {
    descending(a.relative_diff, b.relative_diff)
        .then_with(|| descending(a.absolute_diff, b.absolute_diff))
        .then_with(|| a.table_name.cmp(&b.table_name))
        .then_with(|| a.row_key.cmp(&b.row_key))
        .then_with(|| a.measure_name.cmp(&b.measure_name))
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// One overview line per compared table.
pub fn summary_rows(comparison: &str, table_diffs: &BTreeMap<String, TableDiff>) -> Vec<SummaryRow> {
    table_diffs
        .values()
        .map(|diff| {
            let cells_compared = diff.cell_results.len();
            let cells_differing = diff
                .cell_results
                .iter()
                .filter(|c| c.status == CellStatus::Differs)
                .count();
            let error = (diff.table_status == TableStatus::StructuralMismatch)
                .then(|| format!("structural mismatch: {}", diff.schema_diff.describe()));
            SummaryRow {
                table_name: diff.table_name.clone(),
                comparison: comparison.to_string(),
                status: diff.table_status,
                cells_compared,
                cells_differing,
                difference_percent: percent(cells_differing, cells_compared),
                error,
            }
        })
        .collect()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CellAccumulator {
    compared: usize,
    differing: usize,
    missing_left: usize,
    missing_right: usize,
    not_comparable: usize,
    absolute: Magnitude,
    relative: Magnitude,
}

impl CellAccumulator {
    fn add(&mut self, cell: &CellComparison) {
        self.compared += 1;
        match cell.status {
            CellStatus::Equal => {}
            CellStatus::Differs => {
                self.differing += 1;
                self.absolute.add(cell.absolute_diff);
                self.relative.add(cell.relative_diff);
            }
            CellStatus::MissingLeft => self.missing_left += 1,
            CellStatus::MissingRight => self.missing_right += 1,
            CellStatus::NotComparable => self.not_comparable += 1,
        }
    }

    fn non_equal(&self) -> usize {
        self.differing + self.missing_left + self.missing_right + self.not_comparable
    }

    fn finish(&self) -> CellStats {
        CellStats {
            cells_compared: self.compared,
            cells_differing: self.differing,
            missing_left: self.missing_left,
            missing_right: self.missing_right,
            not_comparable: self.not_comparable,
            difference_percent: percent(self.differing, self.compared),
            max_absolute_diff: self.absolute.max,
            mean_absolute_diff: self.absolute.mean(),
            max_relative_diff: self.relative.max,
            mean_relative_diff: self.relative.mean(),
        }
    }
}

/// Max and running sum over defined values.
#[derive(Default)]
struct Magnitude {
    max: Option<f64>,
    sum: f64,
    count: usize,
}

impl Magnitude {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Default)]
struct MeasureAccumulator {
    compared: usize,
    diff_count: usize,
    deltas: Vec<f64>,
}

impl MeasureAccumulator {
    fn add(&mut self, cell: &CellComparison) {
        self.compared += 1;
        if cell.status == CellStatus::Differs {
            self.diff_count += 1;
            if let Some(d) = cell.delta {
                self.deltas.push(d);
            }
        }
    }

    fn finish(mut self) -> MeasureStats {
        self.deltas.sort_by(f64::total_cmp);
        let n = self.deltas.len();
        let median = match n {
            0 => None,
            _ if n % 2 == 1 => Some(self.deltas[n / 2]),
            _ => Some((self.deltas[n / 2 - 1] + self.deltas[n / 2]) / 2.0),
        };
        let mean = (n > 0).then(|| self.deltas.iter().sum::<f64>() / n as f64);
        MeasureStats {
            diff_count: self.diff_count,
            diff_percent: percent(self.diff_count, self.compared),
            min_delta: self.deltas.first().copied(),
            max_delta: self.deltas.last().copied(),
            median_delta: median,
            mean_delta: mean,
        }
    }
}
