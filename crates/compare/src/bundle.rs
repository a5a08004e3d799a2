use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CompareError, Result};
use crate::table::TableModel;

/// All output tables produced by one execution of a model under one runtime.
///
/// Built once from the extraction step and never patched afterwards.
#[derive(Debug, Clone)]
pub struct RunBundle {
    run_id: String,
    tables: BTreeMap<String, TableModel>,
}

impl RunBundle {
    pub fn new(run_id: impl Into<String>, tables: Vec<TableModel>) -> Result<Self> {
        let run_id = run_id.into();
        let mut by_name = BTreeMap::new();
        for table in tables {
            let name = table.name().to_string();
            if by_name.insert(name.clone(), table).is_some() {
                return Err(CompareError::malformed(
                    &name,
                    format!("table appears more than once in run '{run_id}'"),
                ));
            }
        }
        Ok(Self {
            run_id,
            tables: by_name,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn get_table(&self, name: &str) -> Result<&TableModel> {
        self.tables.get(name).ok_or_else(|| CompareError::TableNotFound {
            run_id: self.run_id.clone(),
            table: name.to_string(),
        })
    }

    pub fn table_names(&self) -> BTreeSet<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &TableModel> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total row count across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.values().map(TableModel::len).sum()
    }
}
