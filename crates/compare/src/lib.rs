//! `runcmp-compare`: Run comparison engine for simulation output tables.
//!
//! Pure engine crate: receives loaded run bundles, returns classified diffs,
//! summary statistics and a top-N deviation list. The `load` module is the
//! only place that touches the filesystem.

pub mod aggregate;
pub mod bundle;
pub mod config;
pub mod differ;
pub mod engine;
pub mod error;
pub mod float;
pub mod load;
pub mod model;
pub mod reconcile;
pub mod table;

pub use bundle::RunBundle;
pub use config::{CompareConfig, Tolerance};
pub use engine::{compare, compare_suite};
pub use error::{CompareError, Result};
pub use load::load_bundle;
pub use model::{
    CellComparison, CellStatus, ComparisonResult, Deviation, SummaryRow, SuiteResult, TableDiff, TableStatus,
};
pub use table::{DimValue, MeasureValue, Record, RowKey, TableModel, Value};
